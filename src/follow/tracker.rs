//! Active-order timeout tracking and cancellation.
//!
//! Every working follow order carries an elapsed-ticks counter advanced
//! once per timer tick. Past its threshold the order is cancelled and the
//! counter restarts; past `max_cancel` attempts the tracker drops the
//! order for good. Chase resends get their own (usually shorter) timeout.

use crate::follow::engine::FollowEngine;
use crate::follow::gateway::Gateway;
use crate::follow::types::{Direction, OrderData};

impl<G: Gateway> FollowEngine<G> {
    /// Timer-tick scan over every tracked order.
    pub(crate) fn scan_timeout_orders(&mut self) {
        let orderids: Vec<String> = self.active_order_counters.keys().cloned().collect();
        for orderid in orderids {
            let is_chase_resend =
                self.chase_orderids.contains(&orderid) && !self.first_orderids.contains(&orderid);
            let (timeout, kind) = if is_chase_resend {
                (self.settings.chase_order_timeout, "chase")
            } else {
                (self.settings.cancel_order_timeout, "follow")
            };

            // The cancel budget is a hard bound; the order leaves the
            // tracker before a max_cancel + 1st attempt could happen.
            let cancels = self.cancel_counts.get(&orderid).copied().unwrap_or(0);
            if cancels >= self.settings.max_cancel {
                self.log(format!(
                    "{kind} order {orderid} cancelled {} times, giving up",
                    self.settings.max_cancel
                ));
                self.active_order_counters.remove(&orderid);
                continue;
            }

            let elapsed = self.active_order_counters.get(&orderid).copied().unwrap_or(0);
            if elapsed > timeout {
                self.cancel_order(&orderid, true);
                self.active_order_counters.insert(orderid.clone(), 0);
                *self.cancel_counts.entry(orderid.clone()).or_insert(0) += 1;
                self.log(format!("{kind} order {orderid} timed out, cancel sent"));
            }

            if let Some(counter) = self.active_order_counters.get_mut(&orderid) {
                *counter += 1;
            }
        }
    }

    /// Cancel one working order. `allow_resend = false` marks operator
    /// intervention: the order leaves the chase set first so its
    /// cancellation cannot trigger a resend.
    pub(crate) fn cancel_order(&mut self, orderid: &str, allow_resend: bool) {
        let Some(order) = self.gateway.get_order(orderid) else {
            self.log(format!("cancel failed, unknown order {orderid}"));
            return;
        };

        if !allow_resend {
            self.chase_orderids.remove(orderid);
        }

        let req = order.create_cancel_request();
        self.gateway.cancel_order(&req, &order.gateway_name);
        self.log(format!("cancel request sent for order {orderid}"));
    }

    /// Cancel working follow orders at the target, optionally restricted
    /// to one contract and/or to keep-after-chase residuals only.
    pub(crate) fn cancel_all(
        &mut self,
        vt_symbol: Option<&str>,
        allow_resend: bool,
        only_fail_chase: bool,
    ) {
        let active = self.gateway.get_all_active_orders(vt_symbol);
        for order in active {
            if order.gateway_name != self.settings.target_gateway {
                continue;
            }
            if !self.is_follow_child(&order.orderid) {
                continue;
            }
            if only_fail_chase && !self.fail_chase_orderids.contains(&order.orderid) {
                continue;
            }
            self.cancel_order(&order.orderid, allow_resend);
        }
    }

    /// Book the unfilled remainder of a dead open order as lost-follow
    /// debt on its contract.
    pub(crate) fn add_lost_follow(&mut self, order: &OrderData) {
        let vt_symbol = order.vt_symbol();
        let remainder = (order.volume - order.traded.min(order.volume)) as i64;
        let lost = match order.direction {
            Direction::Short => -remainder,
            _ => remainder,
        };
        self.positions.entry_mut(&vt_symbol).lost_follow_net += lost;
        self.emit_pos_delta(&vt_symbol);
        self.save_run_data_now();
    }
}
