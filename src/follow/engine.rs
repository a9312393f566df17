//! The follow engine: state tables, event handlers and the command surface.
//!
//! One engine instance owns every mutable table. It is driven from a single
//! consumer loop (see [`crate::follow::bus`]); gateways and operators only
//! reach it through [`MarketEvent`]s and [`FollowCommand`]s. The heavier
//! pipeline stages live in sibling modules as further `impl` blocks on
//! [`FollowEngine`]: filtering in `filters`, request building in `builder`,
//! dispatch in `dispatch`, timeout tracking in `tracker`, chasing in
//! `chase` and manual synchronization in `sync`.

use crate::follow::catalog::{SymbolCatalog, product_prefix};
use crate::follow::dispatch::PendingRequest;
use crate::follow::error::FollowError;
use crate::follow::events::{LogEvent, LogListener, MarketEvent};
use crate::follow::gateway::Gateway;
use crate::follow::offset::OffsetConverter;
use crate::follow::positions::{PosDeltaListener, PosField, PositionBook};
use crate::follow::pricing::PriceCache;
use crate::follow::settings::{FollowSettings, Parameter};
use crate::follow::store::{AccountCsvRow, DataStore, RunData, TradeCsvRow};
use crate::follow::types::{
    ContractData, FollowBaseMode, OrderData, PositionData, RunType, Status, TickData, TradeData,
};
use crate::utils;
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Operator command accepted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum FollowCommand {
    /// Begin following signals.
    Start,
    /// Stop following; persists settings and run data. Working orders are
    /// left in place.
    Stop,
    /// Mutate one parameter.
    SetParameter(Parameter),
    /// Point the engine at a new source/target gateway pair.
    SetGateways { source: String, target: String },
    /// Overwrite one position counter.
    SetPosition {
        vt_symbol: String,
        field: PosField,
        value: i64,
    },
    /// Overwrite the operator-adjustable position values in one shot.
    ModifyPosition {
        vt_symbol: String,
        basic_delta: i64,
        source_traded_net: i64,
        lost_follow_net: i64,
    },
    /// Open-leg synchronization for one contract.
    SyncOpen(String),
    /// Close-leg synchronization for one contract.
    SyncClose(String),
    /// Open then close synchronization for one contract.
    SyncBoth(String),
    /// Synchronize every non-blacklisted contract.
    SyncAll,
    /// Net-delta synchronization (intraday contracts only).
    SyncNet { vt_symbol: String, basic: bool },
    /// Close a hedged (long and short) quantity at market.
    CloseHedged { vt_symbol: String, volume: u64 },
    /// Cancel working follow orders.
    CancelAll {
        vt_symbol: Option<String>,
        allow_resend: bool,
        only_fail_chase: bool,
    },
}

/// The trade-follower engine.
///
/// Generic over the gateway surface so tests can drive it with an
/// in-memory implementation.
pub struct FollowEngine<G: Gateway> {
    pub(crate) settings: FollowSettings,
    pub(crate) store: DataStore,
    pub(crate) gateway: Arc<G>,
    pub(crate) offset_converter: Box<dyn OffsetConverter>,

    /// Whether signals are currently followed.
    pub(crate) active: bool,

    pub(crate) catalog: SymbolCatalog,
    pub(crate) prices: PriceCache,
    pub(crate) positions: PositionBook,

    /// signal id -> child order ids. Doubles as the follow-order registry.
    pub(crate) signal_orderids: HashMap<String, Vec<String>>,
    /// child order id -> signal id.
    pub(crate) orderid_to_signal: HashMap<String, String>,
    /// Every source trade id ever seen; replayed pushes short-circuit here.
    pub(crate) seen_tradeids: HashSet<String>,
    /// Source order ids already accepted once (order mode dedup).
    pub(crate) accepted_orderids: HashSet<String>,
    /// Source order ids the source account has left working; their
    /// children are exempt from timeout cancellation.
    pub(crate) keep_hang: HashSet<String>,
    /// Keep-after-chase residual orders, never cancelled by the tracker.
    pub(crate) fail_chase_orderids: HashSet<String>,
    /// Open-side follow orders watched for lost-follow accounting.
    pub(crate) open_orderids: HashSet<String>,
    /// Direct products of a signal, as opposed to chase resends.
    pub(crate) first_orderids: HashSet<String>,
    /// Orders counted into the day's intraday flow.
    pub(crate) intraday_orderids: HashSet<String>,

    /// Orders eligible for cancel-and-resend.
    pub(crate) chase_orderids: HashSet<String>,
    /// chase order id -> original order id.
    pub(crate) chase_ancestors: HashMap<String, String>,
    /// original order id -> resends so far.
    pub(crate) chase_resend_counts: HashMap<String, u32>,

    /// Working follow orders -> elapsed timer ticks.
    pub(crate) active_order_counters: HashMap<String, u32>,
    /// order id -> cancel attempts.
    pub(crate) cancel_counts: HashMap<String, u32>,

    /// Requests waiting for their symbol to become priced.
    pub(crate) send_queue: VecDeque<PendingRequest>,
    /// Symbols already pre-subscribed from position pushes.
    pub(crate) pre_subscribed: HashSet<String>,

    /// End-of-session autosave latch; one save per session.
    pub(crate) trade_saved: bool,
    /// Monotonic suffix for minted sync ids.
    pub(crate) sync_order_ref: u64,
    /// Last tick timestamp; the clock in test mode.
    pub(crate) tick_time: Option<NaiveDateTime>,

    pub(crate) log_listener: Option<LogListener>,
    pub(crate) pos_delta_listener: Option<PosDeltaListener>,
}

impl<G: Gateway> FollowEngine<G> {
    /// Build an engine over `store` and `gateway`, loading the settings and
    /// run-data documents (missing files yield defaults).
    pub fn new(
        store: DataStore,
        gateway: Arc<G>,
        offset_converter: Box<dyn OffsetConverter>,
    ) -> Result<Self, FollowError> {
        let settings = store.load_settings()?;
        let run_data = store.load_run_data()?;

        let mut orderid_to_signal = HashMap::new();
        for (signal, children) in &run_data.signal_orderids {
            for child in children {
                orderid_to_signal.insert(child.clone(), signal.clone());
            }
        }

        let mut positions = PositionBook::new();
        positions.replace(run_data.positions);

        Ok(Self {
            settings,
            store,
            gateway,
            offset_converter,
            active: false,
            catalog: SymbolCatalog::new(),
            prices: PriceCache::new(),
            positions,
            signal_orderids: run_data.signal_orderids,
            orderid_to_signal,
            seen_tradeids: HashSet::new(),
            accepted_orderids: HashSet::new(),
            keep_hang: HashSet::new(),
            fail_chase_orderids: HashSet::new(),
            open_orderids: HashSet::new(),
            first_orderids: HashSet::new(),
            intraday_orderids: HashSet::new(),
            chase_orderids: HashSet::new(),
            chase_ancestors: HashMap::new(),
            chase_resend_counts: HashMap::new(),
            active_order_counters: HashMap::new(),
            cancel_counts: HashMap::new(),
            send_queue: VecDeque::new(),
            pre_subscribed: HashSet::new(),
            trade_saved: false,
            sync_order_ref: 0,
            tick_time: None,
            log_listener: None,
            pos_delta_listener: None,
        })
    }

    /// Attach a log observer.
    pub fn set_log_listener(&mut self, listener: LogListener) {
        self.log_listener = Some(listener);
    }

    /// Attach a position-delta observer.
    pub fn set_pos_delta_listener(&mut self, listener: PosDeltaListener) {
        self.pos_delta_listener = Some(listener);
    }

    /// Seed the trade dedup set from the gateway and subscribe the test
    /// clock symbol if running in test mode. Call once before the first
    /// event.
    pub fn init(&mut self) {
        self.update_tradeids();
        if self.settings.run_type == RunType::Test && !self.settings.test_symbol.is_empty() {
            let symbol = self.settings.test_symbol.clone();
            self.subscribe(&symbol);
            self.log("test mode: subscribed clock symbol");
        }
        self.log("follow engine initialized");
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &FollowSettings {
        &self.settings
    }

    /// Whether the engine is following signals.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Position book (read-only).
    #[must_use]
    pub fn positions(&self) -> &PositionBook {
        &self.positions
    }

    /// Child order ids dispatched for `signal_id`, if any.
    #[must_use]
    pub fn children_of(&self, signal_id: &str) -> Option<&[String]> {
        self.signal_orderids.get(signal_id).map(Vec::as_slice)
    }

    /// Deliver one bus event. Handler errors never escape: they are
    /// converted to log output and the event is dropped.
    pub fn handle_event(&mut self, event: MarketEvent) {
        let result = match event {
            MarketEvent::Tick(tick) => {
                self.on_tick(tick);
                Ok(())
            }
            MarketEvent::Order(order) => self.on_order(order),
            MarketEvent::Trade(trade) => self.on_trade(trade),
            MarketEvent::Position(position) => self.on_position(position),
            MarketEvent::Timer => {
                self.on_timer();
                Ok(())
            }
        };
        if let Err(e) = result {
            self.log(format!("event handler error: {e}"));
        }
    }

    /// Execute one operator command.
    pub fn handle_command(&mut self, command: FollowCommand) {
        match command {
            FollowCommand::Start => {
                self.start();
            }
            FollowCommand::Stop => {
                self.stop();
            }
            FollowCommand::SetParameter(parameter) => self.set_parameter(parameter),
            FollowCommand::SetGateways { source, target } => self.set_gateways(source, target),
            FollowCommand::SetPosition {
                vt_symbol,
                field,
                value,
            } => self.set_position(&vt_symbol, field, value),
            FollowCommand::ModifyPosition {
                vt_symbol,
                basic_delta,
                source_traded_net,
                lost_follow_net,
            } => self.modify_position(&vt_symbol, basic_delta, source_traded_net, lost_follow_net),
            FollowCommand::SyncOpen(vt_symbol) => self.sync_open_pos(&vt_symbol),
            FollowCommand::SyncClose(vt_symbol) => self.sync_close_pos(&vt_symbol),
            FollowCommand::SyncBoth(vt_symbol) => self.sync_pos(&vt_symbol),
            FollowCommand::SyncAll => self.sync_all_pos(),
            FollowCommand::SyncNet { vt_symbol, basic } => {
                self.sync_net_pos_delta(&vt_symbol, basic)
            }
            FollowCommand::CloseHedged { vt_symbol, volume } => {
                self.close_hedged_pos(&vt_symbol, volume)
            }
            FollowCommand::CancelAll {
                vt_symbol,
                allow_resend,
                only_fail_chase,
            } => self.cancel_all(vt_symbol.as_deref(), allow_resend, only_fail_chase),
        }
    }

    /// Begin following. Refuses when already active or when both accounts
    /// point at the same gateway.
    pub fn start(&mut self) -> bool {
        if self.active {
            self.log("follow trading already running");
            return false;
        }
        if self.settings.source_gateway == self.settings.target_gateway {
            self.log("source and target gateway must differ");
            return false;
        }
        self.active = true;
        self.log("follow trading started");
        true
    }

    /// Stop following. Persists settings, run data and the trade file;
    /// inside the end-of-session window the run data is also archived and
    /// cleared. Working orders are deliberately left in place.
    pub fn stop(&mut self) -> bool {
        if !self.active {
            self.log("follow trading not running");
            return false;
        }
        self.active = false;
        self.log("follow trading stopped");

        for key in self.positions.clear_empty() {
            debug!(vt_symbol = %key, "empty position cleared");
        }
        let catalog = &self.catalog;
        let gateway = Arc::clone(&self.gateway);
        let expired = self
            .positions
            .clear_expired(|key| catalog.contains(key) || gateway.get_contract(key).is_some());
        for key in expired {
            self.log(format!("{key} expired, position cleared"));
        }

        if let Err(e) = self.store.save_settings(&self.settings) {
            self.log(format!("settings save failed: {e}"));
        }
        self.save_run_data_now();
        self.save_trades();

        let now = self.current_time().time();
        if utils::in_save_window(now, self.settings.daylight_end, self.settings.night_begin) {
            self.clear_follow_data();
            self.save_account_info();
        }
        true
    }

    /// Apply one parameter mutation.
    pub fn set_parameter(&mut self, parameter: Parameter) {
        debug!(?parameter, "parameter update");
        parameter.apply(&mut self.settings);
    }

    /// Point the engine at a new source/target gateway pair.
    pub fn set_gateways(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.settings.source_gateway = source.into();
        self.settings.target_gateway = target.into();
    }

    /// Overwrite one position counter and notify observers.
    pub fn set_position(&mut self, vt_symbol: &str, field: PosField, value: i64) {
        self.positions
            .set_field(vt_symbol, field, value, self.settings.multiplier);
        self.emit_pos_delta(vt_symbol);
        self.save_run_data_now();
    }

    /// Overwrite the operator-adjustable values of one position.
    pub fn modify_position(
        &mut self,
        vt_symbol: &str,
        basic_delta: i64,
        source_traded_net: i64,
        lost_follow_net: i64,
    ) {
        let multiplier = self.settings.multiplier;
        self.positions
            .set_field(vt_symbol, PosField::BasicDelta, basic_delta, multiplier);
        self.positions.set_field(
            vt_symbol,
            PosField::SourceTradedNet,
            source_traded_net,
            multiplier,
        );
        self.positions.set_field(
            vt_symbol,
            PosField::LostFollowNet,
            lost_follow_net,
            multiplier,
        );
        self.emit_pos_delta(vt_symbol);
        self.save_run_data_now();
        self.log(format!("{vt_symbol} position modified"));
    }

    fn on_tick(&mut self, tick: TickData) {
        self.tick_time = Some(tick.datetime);
        self.prices.record_tick(&tick);
    }

    fn on_order(&mut self, order: OrderData) -> Result<(), FollowError> {
        if order.gateway_name == self.settings.source_gateway {
            self.on_source_order(&order)?;
        }
        if order.gateway_name == self.settings.target_gateway {
            self.on_target_order(&order)?;
        }
        Ok(())
    }

    fn on_source_order(&mut self, order: &OrderData) -> Result<(), FollowError> {
        if self.settings.follow_based == FollowBaseMode::BaseTrade {
            return Ok(());
        }

        if matches!(
            order.status,
            Status::NotTraded | Status::PartTraded | Status::AllTraded
        ) {
            // Gateways push several status updates per order; only the
            // first one may trigger a follow.
            if self.is_duplicated_order(order) {
                return Ok(());
            }
            if !self.active {
                self.log(format!(
                    "order {} not followed, engine not started",
                    order.orderid
                ));
                return Ok(());
            }
            if !self.filter_source_order(order) {
                return Ok(());
            }

            self.log(format!("order {} passed checks, following", order.orderid));
            let req = self.convert_order_to_request(order);
            self.send_order(req, order.orderid.clone(), true);
        }

        // A working source order holds its children open; they only start
        // cancel timing once the source order leaves this set.
        if matches!(order.status, Status::NotTraded | Status::PartTraded) {
            debug!(orderid = %order.orderid, "source order added to keep-hang");
            self.keep_hang.insert(order.orderid.clone());
        }

        if order.status == Status::Cancelled {
            // Operator intervention at the source: children must not be
            // chased after this cancel.
            let children = self
                .signal_orderids
                .get(&order.orderid)
                .cloned()
                .unwrap_or_default();
            for child in children {
                self.cancel_order(&child, false);
            }
        }
        Ok(())
    }

    fn on_target_order(&mut self, order: &OrderData) -> Result<(), FollowError> {
        self.offset_converter.update_order(order);

        if !self.is_follow_child(&order.orderid) {
            return Ok(());
        }
        if self.fail_chase_orderids.contains(&order.orderid) {
            return Ok(());
        }

        if order.is_active() {
            if self.settings.follow_based == FollowBaseMode::BaseOrder {
                if let Some(signal) = self.orderid_to_signal.get(&order.orderid) {
                    if self.keep_hang.contains(signal) {
                        debug!(orderid = %order.orderid, "keep-hang child, no cancel timing");
                        return Ok(());
                    }
                }
            }
            self.active_order_counters.insert(order.orderid.clone(), 0);
            self.cancel_counts.insert(order.orderid.clone(), 0);
        } else {
            self.active_order_counters.remove(&order.orderid);

            if order.status == Status::Cancelled {
                if self.open_orderids.contains(&order.orderid) {
                    self.add_lost_follow(order);
                }
                if self.chase_orderids.contains(&order.orderid) {
                    self.continue_chase(order)?;
                }
            }
        }
        Ok(())
    }

    fn on_trade(&mut self, trade: TradeData) -> Result<(), FollowError> {
        // Reconnects replay the whole trade history; dedup on trade id.
        if !self.seen_tradeids.insert(trade.tradeid.clone()) {
            debug!(tradeid = %trade.tradeid, "duplicate trade push");
            return Ok(());
        }

        if trade.gateway_name == self.settings.source_gateway {
            self.on_source_trade(&trade)?;
        } else if trade.gateway_name == self.settings.target_gateway {
            self.on_target_trade(&trade)?;
        }
        Ok(())
    }

    fn on_source_trade(&mut self, trade: &TradeData) -> Result<(), FollowError> {
        let key = self
            .positions
            .apply_source_trade(trade, self.settings.multiplier);
        self.emit_pos_delta(&key);

        if self.settings.follow_based == FollowBaseMode::BaseOrder {
            return Ok(());
        }
        if !self.active {
            self.log(format!(
                "trade {} not followed, engine not started",
                trade.tradeid
            ));
            return Ok(());
        }
        if !self.filter_source_trade(trade) {
            return Ok(());
        }

        let legs = if !self.settings.intraday_trading {
            // Outside intraday mode only closes are urgent; opens rest at
            // the configured base price.
            vec![(trade.clone(), trade.offset.is_close())]
        } else {
            let legs = self.split_trade_open_close(trade);
            self.positions
                .add_source_traded_net(&key, trade.net_volume());
            self.emit_pos_delta(&key);
            self.save_run_data_now();
            legs
        };

        self.log(format!("trade {} passed checks, following", trade.tradeid));

        for (leg, must_done) in legs {
            if let Some(req) = self.convert_trade_to_request(&leg, must_done) {
                self.send_order(req, leg.tradeid.clone(), must_done);
            }
        }
        Ok(())
    }

    fn on_target_trade(&mut self, trade: &TradeData) -> Result<(), FollowError> {
        self.offset_converter.update_trade(trade);
        let key = self
            .positions
            .apply_target_trade(trade, self.settings.multiplier);
        self.emit_pos_delta(&key);

        if !self.is_follow_child(&trade.orderid) {
            debug!(tradeid = %trade.tradeid, "target trade not from the follow engine");
            return Ok(());
        }
        self.save_run_data_now();
        self.log(format!("{key} position updated"));
        Ok(())
    }

    fn on_position(&mut self, position: PositionData) -> Result<(), FollowError> {
        if self.active {
            self.pre_subscribe(&position);
        }

        if position.gateway_name == self.settings.source_gateway {
            if let Some(key) = self
                .positions
                .apply_source_position(&position, self.settings.multiplier)
            {
                self.emit_pos_delta(&key);
            }
        } else if position.gateway_name == self.settings.target_gateway {
            self.offset_converter.update_position(&position);
            if let Some(key) = self
                .positions
                .apply_target_position(&position, self.settings.multiplier)
            {
                self.emit_pos_delta(&key);
            }
        }
        Ok(())
    }

    fn on_timer(&mut self) {
        self.process_send_queue();
        self.scan_timeout_orders();
        self.auto_save();
    }

    /// Subscribe market data early for every contract the source account
    /// holds, so follows do not wait in the queue.
    fn pre_subscribe(&mut self, position: &PositionData) {
        let key = position.vt_symbol();
        if self.pre_subscribed.contains(&key) {
            return;
        }
        if !self.prices.is_priced(&key) && self.subscribe(&key) {
            self.pre_subscribed.insert(key.clone());
            self.log(format!("{key} market data subscription sent"));
        }
    }

    /// End-of-session bookkeeping, at most once per session: trade CSV,
    /// run-data archive + clear, account snapshot.
    fn auto_save(&mut self) {
        if self.trade_saved {
            return;
        }
        let now = self.current_time().time();
        if !utils::in_save_window(now, self.settings.daylight_end, self.settings.night_begin) {
            return;
        }
        self.save_trades();
        self.clear_follow_data();
        self.save_account_info();
        self.trade_saved = true;
    }

    /// Archive run data into the dated history file (skipped when today's
    /// snapshot exists), then clear the session-local subset: the signal
    /// map and the day's source traded nets.
    fn clear_follow_data(&mut self) {
        let data = self.run_data();
        let date = utils::today_compact();
        match self.store.archive_run_data(&data, &date) {
            Ok(true) => self.log("run data archived and cleared"),
            Ok(false) => self.log("history snapshot already present, not overwritten"),
            Err(e) => self.log(format!("run data archive failed: {e}")),
        }

        self.signal_orderids.clear();
        self.orderid_to_signal.clear();
        self.positions.reset_source_traded_net();
        self.save_run_data_now();
    }

    /// Write the accumulated trade history as the dated trade CSV.
    fn save_trades(&mut self) {
        let date = utils::today_compact();
        let accounts = self.gateway.get_all_accounts();
        let account_by_gateway: HashMap<String, String> = accounts
            .iter()
            .map(|a| (a.gateway_name.clone(), a.accountid.clone()))
            .collect();

        let rows: Vec<TradeCsvRow> = self
            .gateway
            .get_all_trades()
            .into_iter()
            .map(|trade| {
                let account_type = if trade.gateway_name == self.settings.source_gateway {
                    "source"
                } else if trade.gateway_name == self.settings.target_gateway {
                    "target"
                } else {
                    ""
                };
                TradeCsvRow {
                    date: date.clone(),
                    dt: format!("{} {}", date, trade.time),
                    gateway_name: trade.gateway_name.clone(),
                    tradeid: trade.tradeid,
                    orderid: trade.orderid,
                    symbol: trade.symbol,
                    exchange: trade.exchange,
                    direction: trade.direction.to_string(),
                    offset: trade.offset.to_string(),
                    price: trade.price,
                    volume: trade.volume,
                    account_type: account_type.to_string(),
                    account_id: account_by_gateway
                        .get(&trade.gateway_name)
                        .cloned()
                        .unwrap_or_default(),
                }
            })
            .collect();

        if rows.is_empty() {
            return;
        }
        match self.store.write_trades(&date, &rows) {
            Ok(()) => self.log("trade history saved"),
            Err(e) => self.log(format!("trade history save failed: {e}")),
        }
    }

    /// Append today's account snapshots to the account-info CSV.
    fn save_account_info(&mut self) {
        let date = utils::today_compact();
        let rows: Vec<AccountCsvRow> = self
            .gateway
            .get_all_accounts()
            .into_iter()
            .map(|account| AccountCsvRow {
                date: date.clone(),
                account_id: account.accountid,
                balance: account.balance,
                available: account.available,
            })
            .collect();
        match self.store.append_account_info(&rows) {
            Ok(()) => self.log("account info saved"),
            Err(e) => self.log(format!("account info save failed: {e}")),
        }
    }

    /// Seed the trade dedup set from everything the gateway has seen.
    fn update_tradeids(&mut self) {
        for trade in self.gateway.get_all_trades() {
            self.seen_tradeids.insert(trade.tradeid);
        }
        debug!(count = self.seen_tradeids.len(), "trade id set seeded");
    }

    /// Engine clock: wall-clock in live mode, last tick time in test mode.
    pub(crate) fn current_time(&self) -> NaiveDateTime {
        match self.settings.run_type {
            RunType::Live => utils::now(),
            RunType::Test => self.tick_time.unwrap_or_else(utils::now),
        }
    }

    /// Contract metadata: catalog first, gateway lookup on miss (cached).
    pub(crate) fn contract(&self, vt_symbol: &str) -> Result<ContractData, FollowError> {
        if let Some(contract) = self.catalog.get(vt_symbol) {
            return Ok(contract.clone());
        }
        self.gateway
            .get_contract(vt_symbol)
            .ok_or_else(|| FollowError::UnknownContract {
                vt_symbol: vt_symbol.to_string(),
            })
    }

    /// Contract metadata with catalog population.
    pub(crate) fn contract_cached(&mut self, vt_symbol: &str) -> Result<ContractData, FollowError> {
        let contract = self.contract(vt_symbol)?;
        if !self.catalog.contains(vt_symbol) {
            self.catalog.insert(contract.clone());
        }
        Ok(contract)
    }

    /// Whether `symbol`'s product trades in broker-locked intraday mode.
    pub(crate) fn is_intraday_symbol(&self, symbol: &str) -> bool {
        self.settings
            .intraday_symbols
            .iter()
            .any(|p| p == product_prefix(symbol))
    }

    /// Whether an order id was produced by this engine (direct child,
    /// chase resend or keep-after-chase residual).
    pub(crate) fn is_follow_child(&self, orderid: &str) -> bool {
        self.chase_orderids.contains(orderid)
            || self.orderid_to_signal.contains_key(orderid)
            || self.fail_chase_orderids.contains(orderid)
    }

    /// Children list for a signal, created on first use.
    pub(crate) fn follow_orderids(&mut self, signal_id: &str) -> &mut Vec<String> {
        self.signal_orderids
            .entry(signal_id.to_string())
            .or_default()
    }

    /// Assemble the run-data document from live state.
    pub(crate) fn run_data(&self) -> RunData {
        RunData {
            signal_orderids: self.signal_orderids.clone(),
            positions: self.positions.to_map(),
        }
    }

    /// Persist run data, logging instead of propagating failures. Called
    /// after every position mutation and successful dispatch so a restart
    /// can recognize already-followed signals.
    pub(crate) fn save_run_data_now(&mut self) {
        let data = self.run_data();
        if let Err(e) = self.store.save_run_data(&data) {
            self.log(format!("run data save failed: {e}"));
        }
    }

    /// Emit the position-delta snapshot for one contract.
    pub(crate) fn emit_pos_delta(&self, vt_symbol: &str) {
        if let Some(snapshot) = self.positions.delta_snapshot(
            vt_symbol,
            self.settings.multiplier,
            self.settings.inverse_follow,
        ) {
            debug!(vt_symbol = %vt_symbol, net_delta = snapshot.net_delta, "position delta");
            if let Some(listener) = &self.pos_delta_listener {
                listener(&snapshot);
            }
        }
    }

    /// Operator-visible log line: tracing plus the attached listener.
    pub(crate) fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "copytrade", "{message}");
        if let Some(listener) = &self.log_listener {
            listener(&LogEvent::new(message));
        }
    }

    /// Warn-level variant of [`Self::log`].
    pub(crate) fn log_warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(target: "copytrade", "{message}");
        if let Some(listener) = &self.log_listener {
            listener(&LogEvent::new(message));
        }
    }
}
