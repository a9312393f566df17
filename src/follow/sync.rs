//! Manual position synchronization.
//!
//! Planners compute the orders needed to reconcile the target account to
//! the source account, either leg-wise (open/close sync) or by net delta
//! (intraday contracts). Every plan flows through the regular dispatch
//! pipeline under a minted `SYNC_`/`BASIC_` signal id, so fills update the
//! target counters like any follow order.

use crate::follow::engine::FollowEngine;
use crate::follow::gateway::Gateway;
use crate::follow::types::{ContractKey, Direction, Offset, OrderRequest, OrderType, RefTag};
use chrono::Timelike;

impl<G: Gateway> FollowEngine<G> {
    /// Mint a unique synthetic signal id, `SYNC_HHMMSSmmm_N` or
    /// `BASIC_HHMMSSmmm_N`.
    fn mint_sync_id(&mut self, basic: bool) -> String {
        let now = self.current_time();
        let millis = now.nanosecond() / 1_000_000;
        self.sync_order_ref += 1;
        format!(
            "{}_{}{:03}_{}",
            if basic { "BASIC" } else { "SYNC" },
            now.format("%H%M%S"),
            millis,
            self.sync_order_ref
        )
    }

    fn send_sync_order(
        &mut self,
        vt_symbol: &str,
        direction: Direction,
        offset: Offset,
        volume: u64,
        market_price: bool,
        basic: bool,
    ) {
        if !self.active {
            self.log("cannot sync before the engine is started");
            return;
        }
        let contract = match self.contract_cached(vt_symbol) {
            Ok(contract) => contract,
            Err(e) => {
                self.log(format!("sync failed: {e}"));
                return;
            }
        };

        // -1 is the explicit market-price sentinel understood by the
        // price converter.
        let price = if market_price { -1.0 } else { 0.0 };
        let req = OrderRequest::new(
            contract.symbol,
            contract.exchange,
            direction,
            OrderType::Limit,
            volume,
            price,
            offset,
            if basic { RefTag::Basic } else { RefTag::Sync },
        );

        let signal_id = self.mint_sync_id(basic);
        self.send_order(req, signal_id, false);
    }

    /// Buy open `volume`.
    pub(crate) fn buy(&mut self, vt_symbol: &str, volume: u64, market_price: bool, basic: bool) {
        self.send_sync_order(
            vt_symbol,
            Direction::Long,
            Offset::Open,
            volume,
            market_price,
            basic,
        );
    }

    /// Sell short `volume`.
    pub(crate) fn short(&mut self, vt_symbol: &str, volume: u64, market_price: bool, basic: bool) {
        self.send_sync_order(
            vt_symbol,
            Direction::Short,
            Offset::Open,
            volume,
            market_price,
            basic,
        );
    }

    /// Sell to close a long holding.
    pub(crate) fn sell(&mut self, vt_symbol: &str, volume: u64, market_price: bool) {
        self.send_sync_order(
            vt_symbol,
            Direction::Short,
            Offset::Close,
            volume,
            market_price,
            false,
        );
    }

    /// Buy to cover a short holding.
    pub(crate) fn cover(&mut self, vt_symbol: &str, volume: u64, market_price: bool) {
        self.send_sync_order(
            vt_symbol,
            Direction::Long,
            Offset::Close,
            volume,
            market_price,
            false,
        );
    }

    /// Open-leg synchronization: open whatever the target is short of on
    /// either leg. Not available for intraday products.
    pub(crate) fn sync_open_pos(&mut self, vt_symbol: &str) {
        if self.is_intraday_vt_symbol(vt_symbol) {
            self.log(format!("{vt_symbol} is intraday, only net sync is supported"));
            return;
        }
        if !self.pos_exists(vt_symbol) {
            return;
        }
        // Only keep-after-chase residuals are swept; live follow work
        // stays untouched.
        self.cancel_all(Some(vt_symbol), false, true);

        let Some((long_delta, short_delta)) = self.positions.pos_delta(
            vt_symbol,
            self.settings.multiplier,
            self.settings.inverse_follow,
        ) else {
            return;
        };
        if long_delta > 0 {
            self.buy(vt_symbol, long_delta as u64, false, false);
            self.log(format!("{vt_symbol} buy-open sync order issued"));
        }
        if short_delta > 0 {
            self.short(vt_symbol, short_delta as u64, false, false);
            self.log(format!("{vt_symbol} short-open sync order issued"));
        }
    }

    /// Close-leg synchronization: close whatever the target holds in
    /// excess on either leg. Not available for intraday products.
    pub(crate) fn sync_close_pos(&mut self, vt_symbol: &str) {
        if self.is_intraday_vt_symbol(vt_symbol) {
            self.log(format!("{vt_symbol} is intraday, only net sync is supported"));
            return;
        }
        if !self.pos_exists(vt_symbol) {
            return;
        }
        self.cancel_all(Some(vt_symbol), false, true);

        let Some((long_delta, short_delta)) = self.positions.pos_delta(
            vt_symbol,
            self.settings.multiplier,
            self.settings.inverse_follow,
        ) else {
            return;
        };
        if long_delta < 0 {
            self.sell(vt_symbol, long_delta.unsigned_abs(), false);
            self.log(format!("{vt_symbol} sell-close sync order issued"));
        }
        if short_delta < 0 {
            self.cover(vt_symbol, short_delta.unsigned_abs(), false);
            self.log(format!("{vt_symbol} cover-close sync order issued"));
        }
    }

    /// Combined synchronization: open legs, then close legs.
    pub(crate) fn sync_pos(&mut self, vt_symbol: &str) {
        if !self.pos_exists(vt_symbol) {
            return;
        }
        let Some((long_delta, short_delta)) = self.positions.pos_delta(
            vt_symbol,
            self.settings.multiplier,
            self.settings.inverse_follow,
        ) else {
            return;
        };
        if long_delta == 0 && short_delta == 0 {
            self.log(format!("{vt_symbol} accounts already in sync"));
            return;
        }
        self.sync_open_pos(vt_symbol);
        self.sync_close_pos(vt_symbol);
    }

    /// Synchronize every tracked contract that is not blacklisted.
    pub(crate) fn sync_all_pos(&mut self) {
        let keys: Vec<String> = self.positions.keys().cloned().collect();
        for vt_symbol in keys {
            if !self.settings.skip_contracts.contains(&vt_symbol) {
                self.sync_pos(&vt_symbol);
            }
        }
    }

    /// Net-delta synchronization for an intraday contract: one order for
    /// the signed difference, minus the operator baseline. With `basic`
    /// the order is the new baseline: it goes out at market price and
    /// zeroes `basic_delta`.
    pub(crate) fn sync_net_pos_delta(&mut self, vt_symbol: &str, basic: bool) {
        if !self.is_intraday_vt_symbol(vt_symbol) {
            self.log(format!("{vt_symbol} is not an intraday product"));
            return;
        }
        let Some(mut net_delta) = self.positions.net_pos_delta(
            vt_symbol,
            self.settings.multiplier,
            self.settings.inverse_follow,
        ) else {
            self.log(format!("{vt_symbol} has no follow position"));
            return;
        };
        if !basic {
            let basic_delta = self
                .positions
                .get(vt_symbol)
                .map(|e| e.basic_delta)
                .unwrap_or(0);
            net_delta -= basic_delta;
        }

        if net_delta > 0 {
            self.buy(vt_symbol, net_delta as u64, basic, basic);
        } else if net_delta < 0 {
            self.short(vt_symbol, net_delta.unsigned_abs(), basic, basic);
        } else {
            self.log(format!(
                "{vt_symbol} net delta equals the baseline, nothing to sync"
            ));
            return;
        }

        if basic {
            self.positions.entry_mut(vt_symbol).basic_delta = 0;
            self.emit_pos_delta(vt_symbol);
            self.save_run_data_now();
        }
    }

    /// Close `volume` of a hedged (simultaneously long and short) holding
    /// at market price.
    pub(crate) fn close_hedged_pos(&mut self, vt_symbol: &str, volume: u64) {
        let Some(entry) = self.positions.get(vt_symbol) else {
            self.log(format!("{vt_symbol} has no follow position"));
            return;
        };
        let available = entry.target_long.min(entry.target_short);
        if (volume as i64) <= available {
            self.sell(vt_symbol, volume, true);
            self.cover(vt_symbol, volume, true);
            self.log(format!(
                "{vt_symbol} hedged close orders sent, volume {volume}"
            ));
        } else {
            self.log(format!(
                "{vt_symbol} close volume exceeds the hedged holding"
            ));
        }
    }

    fn is_intraday_vt_symbol(&self, vt_symbol: &str) -> bool {
        match ContractKey::parse(vt_symbol) {
            Some(key) => self.is_intraday_symbol(&key.symbol),
            None => self.is_intraday_symbol(vt_symbol),
        }
    }

    fn pos_exists(&self, vt_symbol: &str) -> bool {
        if self.positions.get(vt_symbol).is_none() {
            self.log(format!("{vt_symbol} has no follow position"));
            return false;
        }
        true
    }
}
