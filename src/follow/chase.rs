//! Cancel-and-resend price chasing.
//!
//! When a chase-eligible order dies cancelled, its unfilled remainder is
//! resent at a more aggressive price, up to `chase_max_resend` times per
//! original order. After the budget runs out, `keep_order_after_chase`
//! optionally leaves one final untracked replacement working.

use crate::follow::engine::FollowEngine;
use crate::follow::error::FollowError;
use crate::follow::gateway::Gateway;
use crate::follow::types::{OrderData, OrderRequest, OrderType, RefTag};

impl<G: Gateway> FollowEngine<G> {
    /// Decide what happens after a chase-eligible order was cancelled:
    /// resend while the ancestor has budget, otherwise optionally leave a
    /// keep-chase residual.
    pub(crate) fn continue_chase(&mut self, order: &OrderData) -> Result<(), FollowError> {
        let Some(ancestor) = self.chase_ancestors.get(&order.orderid).cloned() else {
            return Ok(());
        };
        let resends = self.chase_resend_counts.get(&ancestor).copied().unwrap_or(0);

        if resends < self.settings.chase_max_resend {
            self.resend_order(order)?;
            return Ok(());
        }

        self.log(format!("order {ancestor} exceeded the chase budget"));
        if self.settings.keep_order_after_chase {
            if let Some(new_orderid) = self.direct_send_base_order(order, None) {
                self.fail_chase_orderids.insert(new_orderid);
                self.log(format!(
                    "order {ancestor} chase failed, replacement kept working"
                ));
            }
        }
        Ok(())
    }

    /// Resend the unfilled remainder of a cancelled chase order at the
    /// chase price, inheriting direction and offset.
    pub(crate) fn resend_order(&mut self, order: &OrderData) -> Result<(), FollowError> {
        let new_volume = order.volume.saturating_sub(order.traded);
        if new_volume == 0 {
            return Ok(());
        }

        let vt_symbol = order.vt_symbol();
        let price = if self.settings.chase_base_last_order_price {
            // Chain one tick block off the cancelled order's price.
            self.convert_order_price(
                &vt_symbol,
                order.direction,
                order.price,
                false,
                Some(self.settings.chase_order_tick_add),
                self.settings.chase_base_price,
            )?
        } else {
            self.convert_order_price(
                &vt_symbol,
                order.direction,
                0.0,
                false,
                Some(self.settings.chase_order_tick_add),
                self.settings.chase_base_price,
            )?
        };

        let Some(ancestor) = self.chase_ancestors.get(&order.orderid).cloned() else {
            return Ok(());
        };

        let req = OrderRequest::new(
            order.symbol.clone(),
            order.exchange.clone(),
            order.direction,
            OrderType::Limit,
            new_volume,
            price,
            order.offset,
            RefTag::Chase,
        );

        let Some(orderid) = self
            .gateway
            .send_order(&req, &self.settings.target_gateway)
        else {
            self.log_warn(format!("gateway refused chase resend for {vt_symbol}"));
            return Err(FollowError::SendRejected { vt_symbol });
        };

        self.chase_orderids.insert(orderid.clone());
        self.chase_ancestors.insert(orderid.clone(), ancestor.clone());
        *self.chase_resend_counts.entry(ancestor.clone()).or_insert(0) += 1;
        self.intraday_orderids.insert(orderid.clone());

        self.log(format!(
            "chase resend for {ancestor}: order {orderid}, volume {new_volume} at {price}"
        ));
        Ok(())
    }

    /// Send the unfilled remainder of `order` again at its own price (or
    /// `price` when given), outside every tracking table. Used for the
    /// keep-after-chase residual.
    pub(crate) fn direct_send_base_order(
        &mut self,
        order: &OrderData,
        price: Option<f64>,
    ) -> Option<String> {
        let new_volume = order.volume.saturating_sub(order.traded);
        if new_volume == 0 {
            return None;
        }
        let req = OrderRequest::new(
            order.symbol.clone(),
            order.exchange.clone(),
            order.direction,
            OrderType::Limit,
            new_volume,
            price.unwrap_or(order.price),
            order.offset,
            RefTag::KeepChase,
        );
        self.gateway.send_order(&req, &self.settings.target_gateway)
    }
}
