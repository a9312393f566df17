//! Signal filtering: the ordered predicate pipeline and the order-mode
//! dedup guard.
//!
//! Filters run in a fixed order over a [`SignalRef`]; the first failing
//! predicate short-circuits the pipeline and its name becomes the logged
//! drop reason.

use crate::follow::engine::FollowEngine;
use crate::follow::gateway::Gateway;
use crate::follow::types::{OrderData, Status, TradeData};
use crate::utils;
use chrono::Duration;

/// A source signal under evaluation: either a fill or an order push.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SignalRef<'a> {
    Trade(&'a TradeData),
    Order(&'a OrderData),
}

impl SignalRef<'_> {
    /// The signal id: trade id in trade mode, order id in order mode.
    fn id(&self) -> &str {
        match self {
            SignalRef::Trade(trade) => &trade.tradeid,
            SignalRef::Order(order) => &order.orderid,
        }
    }

    fn vt_symbol(&self) -> String {
        match self {
            SignalRef::Trade(trade) => trade.vt_symbol(),
            SignalRef::Order(order) => order.vt_symbol(),
        }
    }

    fn time(&self) -> &str {
        match self {
            SignalRef::Trade(trade) => &trade.time,
            SignalRef::Order(order) => &order.time,
        }
    }
}

/// One named predicate of the pipeline.
struct SignalFilter<G: Gateway> {
    name: &'static str,
    check: fn(&FollowEngine<G>, &SignalRef<'_>) -> bool,
}

impl<G: Gateway> FollowEngine<G> {
    /// The pipeline, in evaluation order.
    fn signal_filters() -> [SignalFilter<G>; 4] {
        [
            SignalFilter {
                name: "volume_whitelist",
                check: Self::passes_volume_whitelist,
            },
            SignalFilter {
                name: "skip_contract",
                check: Self::passes_skip_contract,
            },
            SignalFilter {
                name: "already_followed",
                check: Self::passes_not_followed,
            },
            SignalFilter {
                name: "timeout",
                check: Self::passes_timeout,
            },
        ]
    }

    /// Evaluate the pipeline; `true` means the signal may be followed.
    fn filter_signal(&self, signal: &SignalRef<'_>) -> bool {
        for filter in Self::signal_filters() {
            if !(filter.check)(self, signal) {
                self.log(format!(
                    "signal {} dropped by {} filter",
                    signal.id(),
                    filter.name
                ));
                return false;
            }
        }
        true
    }

    /// Filter a source fill (trade mode).
    pub(crate) fn filter_source_trade(&self, trade: &TradeData) -> bool {
        self.filter_signal(&SignalRef::Trade(trade))
    }

    /// Filter a source order push (order mode).
    pub(crate) fn filter_source_order(&self, order: &OrderData) -> bool {
        self.filter_signal(&SignalRef::Order(order))
    }

    /// When enabled, the originating order's volume must be whitelisted.
    fn passes_volume_whitelist(&self, signal: &SignalRef<'_>) -> bool {
        if !self.settings.filter_order_volume {
            return true;
        }
        let volume = match signal {
            SignalRef::Order(order) => Some(order.volume),
            SignalRef::Trade(trade) => self
                .gateway
                .get_order(&trade.orderid)
                .map(|order| order.volume),
        };
        match volume {
            Some(v) => self.settings.order_volumes_to_follow.contains(&v),
            // Without the originating order the whitelist cannot be
            // checked; drop rather than follow blind.
            None => false,
        }
    }

    /// Contract must not be blacklisted.
    fn passes_skip_contract(&self, signal: &SignalRef<'_>) -> bool {
        !self
            .settings
            .skip_contracts
            .contains(&signal.vt_symbol())
    }

    /// Signal must not already have follow children (restart guard).
    fn passes_not_followed(&self, signal: &SignalRef<'_>) -> bool {
        !self.signal_orderids.contains_key(signal.id())
    }

    /// Signal must be younger than the follow timeout. Events older than
    /// that usually surface after a slow reconnect.
    fn passes_timeout(&self, signal: &SignalRef<'_>) -> bool {
        let now = self.current_time();
        let Some(event_time) = utils::event_time_on(now, signal.time()) else {
            // Unparseable time: treat as stale.
            return false;
        };
        now.signed_duration_since(event_time) <= Duration::seconds(self.settings.follow_timeout)
    }

    /// Order-mode dedup: each source order id is accepted once. Returns
    /// `true` for a repeated push.
    ///
    /// One repeat matters: when a kept-hanging source order reports fully
    /// filled and children exist, the signal leaves the keep-hang set and
    /// every still-working child starts its cancel timer.
    pub(crate) fn is_duplicated_order(&mut self, order: &OrderData) -> bool {
        if !self.accepted_orderids.contains(&order.orderid) {
            self.accepted_orderids.insert(order.orderid.clone());
            return false;
        }

        if order.status == Status::AllTraded
            && self.signal_orderids.contains_key(&order.orderid)
            && self.keep_hang.remove(&order.orderid)
        {
            self.log(format!(
                "source order {} fully filled, released from keep-hang, cancel timing starts",
                order.orderid
            ));
            let children = self
                .signal_orderids
                .get(&order.orderid)
                .cloned()
                .unwrap_or_default();
            for child in children {
                // With aggressive pricing the child may already be done;
                // only working orders get a timer.
                if let Some(child_order) = self.gateway.get_order(&child) {
                    if !child_order.is_active() {
                        continue;
                    }
                }
                self.active_order_counters.insert(child.clone(), 0);
                self.cancel_counts.insert(child, 0);
            }
        }
        true
    }
}
