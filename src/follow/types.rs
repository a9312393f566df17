//! Market data model shared by the follow engine and its gateways.
//!
//! All enums that end up in the settings or run-data documents are persisted
//! as snake_case string tags so the JSON files stay readable and stable
//! across versions.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Trade/position direction.
///
/// `Net` only appears in position snapshots from gateways that report a
/// single netted leg; it is never a valid direction for a follow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Long / buy side.
    Long,
    /// Short / sell side.
    Short,
    /// Netted composite leg (position snapshots only).
    Net,
}

impl Direction {
    /// The opposite trading side. `Net` has no opposite and is returned
    /// unchanged.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
            Direction::Net => Direction::Net,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
            Direction::Net => write!(f, "net"),
        }
    }
}

/// Open/close flag of an order or trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Offset {
    /// Opens new position.
    Open,
    /// Closes position without a today/yesterday distinction.
    Close,
    /// Closes position opened today (SHFE-style exchanges).
    CloseToday,
    /// Closes position opened on a previous day.
    CloseYesterday,
    /// No offset information. Not a valid follow signal.
    None,
}

impl Offset {
    /// True for any of the close variants.
    #[must_use]
    pub fn is_close(self) -> bool {
        matches!(
            self,
            Offset::Close | Offset::CloseToday | Offset::CloseYesterday
        )
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Open => write!(f, "open"),
            Offset::Close => write!(f, "close"),
            Offset::CloseToday => write!(f, "close_today"),
            Offset::CloseYesterday => write!(f, "close_yesterday"),
            Offset::None => write!(f, "none"),
        }
    }
}

/// Lifecycle status of an order at the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Sent but not yet acknowledged by the exchange.
    Submitting,
    /// Working, nothing filled.
    NotTraded,
    /// Working, partially filled.
    PartTraded,
    /// Fully filled. Terminal.
    AllTraded,
    /// Cancelled. Terminal.
    Cancelled,
    /// Rejected by the gateway or exchange. Terminal.
    Rejected,
}

impl Status {
    /// Whether the order is still working at the exchange.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Status::Submitting | Status::NotTraded | Status::PartTraded
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Submitting => write!(f, "submitting"),
            Status::NotTraded => write!(f, "not_traded"),
            Status::PartTraded => write!(f, "part_traded"),
            Status::AllTraded => write!(f, "all_traded"),
            Status::Cancelled => write!(f, "cancelled"),
            Status::Rejected => write!(f, "rejected"),
        }
    }
}

/// Price type of an outbound order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Limit order at a computed price.
    #[default]
    Limit,
    /// Market order. The engine emulates it with a hard-limit priced limit
    /// order because not every futures gateway accepts true market orders.
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "limit"),
            OrderType::Market => write!(f, "market"),
        }
    }
}

/// Engine run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    /// Replay/simulation mode: the engine clock follows tick timestamps.
    Test,
    /// Production mode: the engine clock is the local wall-clock.
    #[default]
    Live,
}

/// Which side of the book seeds a converted limit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBasePrice {
    /// Opposite top-of-book: ask when buying, bid when selling. Crosses the
    /// spread and fills fast.
    #[default]
    GoodForOther,
    /// Same-side top-of-book: bid when buying, ask when selling. Rests in
    /// the queue.
    GoodForSelf,
}

/// Which source-account event stream drives following.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowBaseMode {
    /// Follow the source account's order submissions.
    BaseOrder,
    /// Follow the source account's fills.
    #[default]
    BaseTrade,
}

/// Role of an outbound order request, recorded as the request reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefTag {
    /// Regular follow child.
    Follow,
    /// Cancel-and-resend replacement issued by the chase loop.
    Chase,
    /// Final non-cancellable replacement after the chase budget ran out.
    KeepChase,
    /// Manual position synchronization.
    Sync,
    /// Baseline-position synchronization.
    Basic,
    /// Follow built from a source order (order mode).
    OrderMod,
    /// Follow built from a source trade (trade mode).
    TradeMod,
}

impl fmt::Display for RefTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefTag::Follow => write!(f, "follow"),
            RefTag::Chase => write!(f, "chase"),
            RefTag::KeepChase => write!(f, "keep_chase"),
            RefTag::Sync => write!(f, "sync"),
            RefTag::Basic => write!(f, "basic"),
            RefTag::OrderMod => write!(f, "order_mod"),
            RefTag::TradeMod => write!(f, "trade_mod"),
        }
    }
}

/// A (symbol, exchange) pair identifying one tradable contract.
///
/// The canonical string form `"symbol.EXCHANGE"` keys every per-contract
/// table in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractKey {
    /// Exchange-local symbol, e.g. `rb2410`.
    pub symbol: String,
    /// Exchange identifier, e.g. `SHFE`.
    pub exchange: String,
}

impl ContractKey {
    /// Create a key from its two components.
    pub fn new(symbol: impl Into<String>, exchange: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: exchange.into(),
        }
    }

    /// Parse a canonical `"symbol.EXCHANGE"` string. Splits on the last dot
    /// so symbols containing dots survive.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let (symbol, exchange) = key.rsplit_once('.')?;
        if symbol.is_empty() || exchange.is_empty() {
            return None;
        }
        Some(Self::new(symbol, exchange))
    }
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.symbol, self.exchange)
    }
}

/// Build the canonical contract key string without allocating a
/// [`ContractKey`].
#[must_use]
pub fn vt_symbol(symbol: &str, exchange: &str) -> String {
    format!("{symbol}.{exchange}")
}

/// Top-of-book tick pushed by a market-data gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickData {
    pub symbol: String,
    pub exchange: String,
    pub datetime: NaiveDateTime,
    pub bid_price_1: f64,
    pub ask_price_1: f64,
    pub limit_up: f64,
    pub limit_down: f64,
}

impl TickData {
    /// Canonical contract key of this tick.
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(&self.symbol, &self.exchange)
    }
}

/// Order status push from a trading gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderData {
    /// Name of the gateway that owns this order.
    pub gateway_name: String,
    pub orderid: String,
    pub symbol: String,
    pub exchange: String,
    pub direction: Direction,
    pub offset: Offset,
    pub order_type: OrderType,
    pub price: f64,
    pub volume: u64,
    /// Volume filled so far.
    pub traded: u64,
    pub status: Status,
    /// Exchange time as `HH:MM:SS`.
    pub time: String,
}

impl OrderData {
    /// Canonical contract key of this order.
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(&self.symbol, &self.exchange)
    }

    /// Whether the order is still working.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Build the cancel request for this order.
    #[must_use]
    pub fn create_cancel_request(&self) -> CancelRequest {
        CancelRequest {
            orderid: self.orderid.clone(),
            symbol: self.symbol.clone(),
            exchange: self.exchange.clone(),
        }
    }
}

/// Fill push from a trading gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeData {
    /// Name of the gateway that owns this fill.
    pub gateway_name: String,
    pub tradeid: String,
    /// Order this fill belongs to.
    pub orderid: String,
    pub symbol: String,
    pub exchange: String,
    pub direction: Direction,
    pub offset: Offset,
    pub price: f64,
    pub volume: u64,
    /// Exchange time as `HH:MM:SS`.
    pub time: String,
}

impl TradeData {
    /// Canonical contract key of this fill.
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(&self.symbol, &self.exchange)
    }

    /// Signed volume: positive for long, negative for short.
    #[must_use]
    pub fn net_volume(&self) -> i64 {
        match self.direction {
            Direction::Short => -(self.volume as i64),
            _ => self.volume as i64,
        }
    }
}

/// Position snapshot for one leg of one contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionData {
    pub gateway_name: String,
    pub symbol: String,
    pub exchange: String,
    /// `Long` or `Short`; gateways that net positions push `Net`, which the
    /// engine ignores.
    pub direction: Direction,
    pub volume: u64,
}

impl PositionData {
    /// Canonical contract key of this position leg.
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(&self.symbol, &self.exchange)
    }
}

/// Static contract metadata from the symbol catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractData {
    pub symbol: String,
    pub exchange: String,
    /// Minimum price increment.
    pub pricetick: f64,
}

impl ContractData {
    /// Canonical contract key of this contract.
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(&self.symbol, &self.exchange)
    }
}

/// Account snapshot used for the daily account-info file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    pub gateway_name: String,
    pub accountid: String,
    pub balance: f64,
    pub available: f64,
}

/// An outbound order before it is accepted by a gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Synthetic request identifier, assigned at build time.
    pub request_id: Uuid,
    pub symbol: String,
    pub exchange: String,
    pub direction: Direction,
    pub order_type: OrderType,
    pub volume: u64,
    pub price: f64,
    pub offset: Offset,
    /// Role of this request in the follow pipeline.
    pub reference: RefTag,
}

impl OrderRequest {
    /// Create a new request with a fresh synthetic id.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        exchange: impl Into<String>,
        direction: Direction,
        order_type: OrderType,
        volume: u64,
        price: f64,
        offset: Offset,
        reference: RefTag,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            symbol: symbol.into(),
            exchange: exchange.into(),
            direction,
            order_type,
            volume,
            price,
            offset,
            reference,
        }
    }

    /// Canonical contract key of this request.
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(&self.symbol, &self.exchange)
    }

    /// Signed volume: positive for long, negative for short.
    #[must_use]
    pub fn net_volume(&self) -> i64 {
        match self.direction {
            Direction::Short => -(self.volume as i64),
            _ => self.volume as i64,
        }
    }

    /// Flip the trading side, keeping everything else.
    #[must_use]
    pub fn inverse(mut self) -> Self {
        self.direction = self.direction.inverse();
        self
    }
}

/// Request to cancel a working order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub orderid: String,
    pub symbol: String,
    pub exchange: String,
}
