//! Send queue and order dispatch.
//!
//! A request for an unpriced symbol triggers one market-data subscription
//! and waits in a FIFO queue; every timer tick drains the entries whose
//! symbols have become priced. Dispatch prices the request, runs it
//! through the offset converter and the volume splitter, sends each piece,
//! and registers every resulting child order id in the follow tables.
//! Run data is saved after each successful dispatch, before the next
//! signal can arrive, so a restart recognizes the follow.

use crate::follow::engine::FollowEngine;
use crate::follow::gateway::Gateway;
use crate::follow::types::OrderRequest;
use std::collections::VecDeque;
use tracing::debug;

/// One queued request waiting for pricing.
#[derive(Debug, Clone)]
pub(crate) struct PendingRequest {
    pub signal_id: String,
    pub request: OrderRequest,
    pub must_done: bool,
}

impl<G: Gateway> FollowEngine<G> {
    /// Entry point for every outbound follow/sync order: dispatch now when
    /// the symbol is priced, otherwise subscribe and queue.
    pub(crate) fn send_order(&mut self, req: OrderRequest, signal_id: String, must_done: bool) {
        let vt_symbol = req.vt_symbol();
        if self.prices.is_priced(&vt_symbol) {
            self.send_and_record(req, &signal_id, must_done);
        } else {
            if self.subscribe(&vt_symbol) {
                self.log(format!("{vt_symbol} market data subscription sent"));
            }
            self.send_queue.push_back(PendingRequest {
                signal_id,
                request: req,
                must_done,
            });
        }
    }

    /// Drain queued requests whose symbols are now priced, preserving
    /// insertion order for the rest.
    pub(crate) fn process_send_queue(&mut self) {
        if self.send_queue.is_empty() {
            return;
        }
        let mut waiting = VecDeque::new();
        while let Some(pending) = self.send_queue.pop_front() {
            if self.prices.is_priced(&pending.request.vt_symbol()) {
                self.send_and_record(pending.request, &pending.signal_id, pending.must_done);
            } else {
                waiting.push_back(pending);
            }
        }
        self.send_queue = waiting;
    }

    /// Price, convert, split and send one request; register the children.
    /// Returns the child order ids (empty when nothing went out).
    pub(crate) fn send_and_record(
        &mut self,
        mut req: OrderRequest,
        signal_id: &str,
        must_done: bool,
    ) -> Vec<String> {
        // Manual sync orders always fill urgently and use their own base
        // price.
        let (must_done, base_price) = if signal_id.starts_with("SYNC") {
            (true, self.settings.sync_base_price)
        } else {
            (must_done, self.settings.order_base_price)
        };

        let vt_symbol = req.vt_symbol();
        match self.convert_order_price(
            &vt_symbol,
            req.direction,
            req.price,
            must_done,
            None,
            base_price,
        ) {
            Ok(price) => req.price = price,
            Err(e) => {
                self.log(format!("price conversion failed for {vt_symbol}: {e}"));
                return Vec::new();
            }
        }

        let orderids = self.convert_and_send_orders(&req, must_done);
        if orderids.is_empty() {
            return orderids;
        }

        self.follow_orderids(signal_id).extend(orderids.clone());
        for orderid in &orderids {
            self.orderid_to_signal
                .insert(orderid.clone(), signal_id.to_string());
            // Distinguishes an initial send from a chase resend when the
            // tracker picks a timeout threshold.
            self.first_orderids.insert(orderid.clone());
        }

        let label = if signal_id.starts_with("SYNC") {
            self.intraday_orderids.extend(orderids.iter().cloned());
            "sync order"
        } else if signal_id.starts_with("BASIC") {
            "basic order"
        } else {
            if self.settings.intraday_trading {
                self.intraday_orderids.extend(orderids.iter().cloned());
            }
            "follow order"
        };
        self.log(format!(
            "{label} {signal_id} dispatched, order ids: {}",
            orderids.join(" ")
        ));

        self.save_run_data_now();
        orderids
    }

    /// Offset-convert, split, and send the pieces of one priced request.
    fn convert_and_send_orders(&mut self, req: &OrderRequest, must_done: bool) -> Vec<String> {
        let lock = self.is_intraday_symbol(&req.symbol);
        let legs = self.offset_converter.convert_request(req, lock);
        if legs.is_empty() {
            self.log_warn(
                "offset conversion failed, target account holdings may be insufficient",
            );
            return Vec::new();
        }

        let mut orderids = Vec::new();
        for leg in legs {
            for piece in self.split_request(leg) {
                let Some(orderid) = self
                    .gateway
                    .send_order(&piece, &self.settings.target_gateway)
                else {
                    self.log_warn(format!(
                        "gateway refused order for {}",
                        piece.vt_symbol()
                    ));
                    continue;
                };
                debug!(orderid = %orderid, volume = piece.volume, price = piece.price, "order sent");
                orderids.push(orderid.clone());

                if !must_done {
                    // Non-urgent opens are watched for lost-follow
                    // accounting if they die unfilled.
                    self.open_orderids.insert(orderid.clone());
                }
                if must_done && self.settings.chase_order {
                    self.chase_orderids.insert(orderid.clone());
                    self.chase_ancestors.insert(orderid.clone(), orderid.clone());
                    self.chase_resend_counts.insert(orderid.clone(), 0);
                }
                self.offset_converter.update_order_request(&piece, &orderid);
            }
        }
        orderids
    }

    /// Subscribe market data for one contract through the source gateway.
    pub(crate) fn subscribe(&mut self, vt_symbol: &str) -> bool {
        match self.contract_cached(vt_symbol) {
            Ok(contract) => self.gateway.subscribe(
                &contract.symbol,
                &contract.exchange,
                &self.settings.source_gateway,
            ),
            Err(_) => {
                self.log(format!("{vt_symbol} contract metadata unavailable"));
                false
            }
        }
    }
}
