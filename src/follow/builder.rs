//! Converting accepted signals into order requests.
//!
//! The builder applies, in order: malformed-signal rejection, the volume
//! multiplier, direction inversion, loss-follow consumption (intraday
//! closes only), the broker-locked intraday passthrough, close
//! normalization with the target-holding clamp, and per-product volume
//! splitting. Intraday mode additionally decomposes each source trade into
//! open/close legs against the day's running net before any of this runs.

use crate::follow::catalog::product_prefix;
use crate::follow::engine::FollowEngine;
use crate::follow::gateway::Gateway;
use crate::follow::types::{
    Direction, Offset, OrderData, OrderRequest, OrderType, RefTag, TradeData,
};
use uuid::Uuid;

impl<G: Gateway> FollowEngine<G> {
    /// Build the follow request for a source order (order mode). The
    /// source price is kept so the child rests where the source order
    /// rests. No close conversion or intraday decomposition applies here.
    pub(crate) fn convert_order_to_request(&self, order: &OrderData) -> OrderRequest {
        let mut req = OrderRequest::new(
            order.symbol.clone(),
            order.exchange.clone(),
            order.direction,
            OrderType::Limit,
            order.volume * self.settings.multiplier.unsigned_abs(),
            order.price,
            order.offset,
            RefTag::OrderMod,
        );
        if self.settings.inverse_follow {
            req = req.inverse();
        }
        req
    }

    /// Build the follow request for a source trade leg, or `None` when
    /// nothing needs to go out (malformed signal, loss-follow consumed the
    /// leg, or the target holds nothing to close).
    ///
    /// The request carries no explicit price; dispatch prices it from
    /// fresh market data when the symbol is ready.
    pub(crate) fn convert_trade_to_request(
        &mut self,
        trade: &TradeData,
        must_done: bool,
    ) -> Option<OrderRequest> {
        if trade.offset == Offset::None {
            self.log(format!(
                "trade {} has no offset, not a regular fill",
                trade.tradeid
            ));
            return None;
        }
        if trade.direction == Direction::Net {
            self.log(format!(
                "trade {} has net direction, not a regular fill",
                trade.tradeid
            ));
            return None;
        }

        let vt_symbol = trade.vt_symbol();
        let mut req = OrderRequest::new(
            trade.symbol.clone(),
            trade.exchange.clone(),
            trade.direction,
            OrderType::Limit,
            trade.volume * self.settings.multiplier.unsigned_abs(),
            0.0,
            trade.offset,
            RefTag::TradeMod,
        );
        if self.settings.inverse_follow {
            req = req.inverse();
        }

        // Intraday closes first consume lost-follow debt on the contract.
        if self.settings.intraday_trading && must_done {
            let lost = self
                .positions
                .get(&vt_symbol)
                .map(|e| e.lost_follow_net)
                .unwrap_or(0);
            if lost != 0 {
                let req_net = req.net_volume();
                if req.volume as i64 > lost.abs() {
                    let to_close = lost + req_net;
                    let entry = self.positions.entry_mut(&vt_symbol);
                    entry.lost_follow_net = 0;
                    self.emit_pos_delta(&vt_symbol);
                    req.volume = to_close.unsigned_abs();
                } else {
                    let entry = self.positions.entry_mut(&vt_symbol);
                    entry.lost_follow_net += req_net;
                    self.emit_pos_delta(&vt_symbol);
                    self.save_run_data_now();
                    self.log(format!(
                        "{vt_symbol} lost net {lost}, close net {req_net}, intraday close fully absorbed"
                    ));
                    return None;
                }
            }
        }

        // Broker-locked intraday products keep their offset untouched; the
        // offset converter nets them downstream.
        if self.is_intraday_symbol(&trade.symbol) {
            return Some(req);
        }

        if req.offset != Offset::Open {
            req.offset = Offset::Close;
            return self.validate_target_pos(req);
        }
        Some(req)
    }

    /// Clamp a close request against the target account's holdings. The
    /// engine can only close what the target actually holds; a shortage
    /// drops the request.
    pub(crate) fn validate_target_pos(&self, mut req: OrderRequest) -> Option<OrderRequest> {
        let vt_symbol = req.vt_symbol();
        let Some(entry) = self.positions.get(&vt_symbol) else {
            self.log(format!("{vt_symbol} has no follow position"));
            return None;
        };

        let held = match req.direction {
            // Buying to close covers a short holding.
            Direction::Long => entry.target_short,
            _ => entry.target_long,
        };
        if held <= 0 {
            self.log(format!("{vt_symbol} target holding too small to close"));
            return None;
        }
        req.volume = req.volume.min(held as u64);
        Some(req)
    }

    /// Decompose an intraday source trade into (leg, must_done) pairs
    /// against the running source traded net. Closing legs are urgent;
    /// opening legs are not. The running net itself is updated by the
    /// caller *after* decomposition.
    pub(crate) fn split_trade_open_close(&mut self, trade: &TradeData) -> Vec<(TradeData, bool)> {
        let vt_symbol = trade.vt_symbol();
        let traded_net = self
            .positions
            .get(&vt_symbol)
            .map(|e| e.source_traded_net)
            .unwrap_or(0);
        let trade_net = trade.net_volume();

        if traded_net == 0 || traded_net.signum() == trade_net.signum() {
            return vec![(trade.clone(), false)];
        }

        if trade_net.abs() <= traded_net.abs() {
            return vec![(trade.clone(), true)];
        }

        // The trade flips through flat: a closing leg for the whole
        // running net, then an opening leg for the overshoot.
        let mut close_leg = trade.clone();
        close_leg.volume = traded_net.unsigned_abs();
        let mut open_leg = trade.clone();
        open_leg.volume = (trade_net + traded_net).unsigned_abs();
        vec![(close_leg, true), (open_leg, false)]
    }

    /// Split a request into per-order pieces bounded by the product's
    /// volume cap: `floor(v / max)` full pieces plus a remainder piece.
    pub(crate) fn split_request(&self, req: OrderRequest) -> Vec<OrderRequest> {
        let order_max = self.settings.order_max(product_prefix(&req.symbol));
        if order_max == 0 || req.volume <= order_max {
            return vec![req];
        }

        let full = req.volume / order_max;
        let remainder = req.volume % order_max;

        let mut pieces = Vec::with_capacity(full as usize + 1);
        for _ in 0..full {
            let mut piece = req.clone();
            piece.request_id = Uuid::new_v4();
            piece.volume = order_max;
            pieces.push(piece);
        }
        if remainder > 0 {
            let mut piece = req.clone();
            piece.request_id = Uuid::new_v4();
            piece.volume = remainder;
            pieces.push(piece);
        }
        pieces
    }
}
