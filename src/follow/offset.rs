//! Close-offset rewriting against the target account's holdings.
//!
//! Exchanges with a today/yesterday position distinction (SHFE-style)
//! reject a generic close; the request has to name which bucket it closes.
//! The converter watches the target account's fills, snapshots and working
//! orders, and rewrites a close request into a close-yesterday leg and/or a
//! close-today leg. Contracts traded in broker-locked intraday mode bypass
//! the rewrite entirely.

use crate::follow::types::{Direction, Offset, OrderData, OrderRequest, PositionData, TradeData};
use std::collections::HashMap;

/// Rewrites close requests into today/yesterday legs.
///
/// Implemented by the host (the engine treats it as an external
/// collaborator); [`NetPositionConverter`] is the bundled implementation.
pub trait OffsetConverter: Send {
    /// Observe a target-account order push (releases close freezes when an
    /// order dies).
    fn update_order(&mut self, order: &OrderData);

    /// Observe a target-account fill.
    fn update_trade(&mut self, trade: &TradeData);

    /// Observe a target-account position snapshot.
    fn update_position(&mut self, position: &PositionData);

    /// Record that `req` went out as order `orderid` (freezes the closed
    /// volume until the order dies).
    fn update_order_request(&mut self, req: &OrderRequest, orderid: &str);

    /// Rewrite one request into dispatchable legs. `lock` marks
    /// broker-locked intraday contracts, which pass through unchanged.
    /// An empty result means the target account cannot support the close.
    fn convert_request(&mut self, req: &OrderRequest, lock: bool) -> Vec<OrderRequest>;
}

/// Exchanges that distinguish today from yesterday positions.
const TODAY_SPLIT_EXCHANGES: [&str; 2] = ["SHFE", "INE"];

#[derive(Debug, Clone, Copy, Default)]
struct Holding {
    /// Total open volume on this leg.
    total: i64,
    /// Volume opened today.
    today: i64,
}

/// Holdings-tracking converter for net-position accounts.
#[derive(Default)]
pub struct NetPositionConverter {
    /// (vt_symbol, held direction) -> holding.
    holdings: HashMap<(String, Direction), Holding>,
    /// orderid -> (holding key, frozen close volume).
    frozen: HashMap<String, ((String, Direction), i64)>,
}

impl NetPositionConverter {
    /// Empty converter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn holding_mut(&mut self, vt_symbol: &str, direction: Direction) -> &mut Holding {
        self.holdings
            .entry((vt_symbol.to_string(), direction))
            .or_default()
    }

    fn frozen_on(&self, key: &(String, Direction)) -> i64 {
        self.frozen
            .values()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| *v)
            .sum()
    }
}

impl OffsetConverter for NetPositionConverter {
    fn update_order(&mut self, order: &OrderData) {
        if !order.is_active() {
            self.frozen.remove(&order.orderid);
        }
    }

    fn update_trade(&mut self, trade: &TradeData) {
        let key = trade.vt_symbol();
        let volume = trade.volume as i64;
        if trade.offset == Offset::Open {
            let holding = self.holding_mut(&key, trade.direction);
            holding.total += volume;
            holding.today += volume;
        } else {
            // Closing reduces the opposite-side holding; today's bucket
            // drains first only for explicit close-today.
            let held = trade.direction.inverse();
            let holding = self.holding_mut(&key, held);
            holding.total -= volume;
            if trade.offset == Offset::CloseToday {
                holding.today -= volume.min(holding.today);
            } else {
                let yesterday = holding.total + volume - holding.today;
                let from_today = (volume - yesterday).max(0);
                holding.today -= from_today.min(holding.today);
            }
        }
    }

    fn update_position(&mut self, position: &PositionData) {
        if position.direction == Direction::Net {
            return;
        }
        let key = position.vt_symbol();
        let holding = self.holding_mut(&key, position.direction);
        holding.total = position.volume as i64;
        holding.today = holding.today.min(holding.total);
    }

    fn update_order_request(&mut self, req: &OrderRequest, orderid: &str) {
        if req.offset.is_close() {
            let key = (req.vt_symbol(), req.direction.inverse());
            self.frozen
                .insert(orderid.to_string(), (key, req.volume as i64));
        }
    }

    fn convert_request(&mut self, req: &OrderRequest, lock: bool) -> Vec<OrderRequest> {
        if lock || !req.offset.is_close() {
            return vec![req.clone()];
        }
        if !TODAY_SPLIT_EXCHANGES.contains(&req.exchange.as_str()) {
            return vec![req.clone()];
        }

        let key = (req.vt_symbol(), req.direction.inverse());
        let holding = self.holdings.get(&key).copied().unwrap_or_default();
        let frozen = self.frozen_on(&key);
        let available = (holding.total - frozen).max(0);
        let today_available = (holding.today - frozen).clamp(0, available);
        let yesterday_available = available - today_available;

        let volume = req.volume as i64;
        if volume > available {
            return Vec::new();
        }

        // Yesterday positions drain first to avoid close-today fees.
        let mut legs = Vec::new();
        let from_yesterday = volume.min(yesterday_available);
        if from_yesterday > 0 {
            let mut leg = req.clone();
            leg.offset = Offset::CloseYesterday;
            leg.volume = from_yesterday as u64;
            legs.push(leg);
        }
        let from_today = volume - from_yesterday;
        if from_today > 0 {
            let mut leg = req.clone();
            leg.offset = Offset::CloseToday;
            leg.volume = from_today as u64;
            legs.push(leg);
        }
        legs
    }
}
