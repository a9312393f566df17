//! Per-symbol price state and limit-price conversion.
//!
//! The cache keeps two maps: daily limit prices, captured from the first
//! tick of the session and retained, and the latest top-of-book, refreshed
//! on every tick. A symbol is *priced* once it has an entry in both, and
//! only priced symbols can leave the send queue.

use crate::follow::engine::FollowEngine;
use crate::follow::error::FollowError;
use crate::follow::gateway::Gateway;
use crate::follow::types::{Direction, OrderBasePrice, OrderType, TickData};
use std::collections::HashMap;

/// Daily hard limits of one symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitPrices {
    pub limit_up: f64,
    pub limit_down: f64,
}

/// Latest top-of-book of one symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotePrices {
    pub bid: f64,
    pub ask: f64,
}

/// Quote after sentinel-value sanitization, safe for price arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanitizedQuote {
    pub bid: f64,
    pub ask: f64,
    pub limit_up: f64,
    pub limit_down: f64,
}

/// Price state for every subscribed symbol.
#[derive(Debug, Clone, Default)]
pub struct PriceCache {
    limits: HashMap<String, LimitPrices>,
    latest: HashMap<String, QuotePrices>,
}

impl PriceCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tick: capture limits on first sight, always refresh the
    /// top-of-book.
    pub fn record_tick(&mut self, tick: &TickData) {
        let key = tick.vt_symbol();
        self.limits.entry(key.clone()).or_insert(LimitPrices {
            limit_up: tick.limit_up,
            limit_down: tick.limit_down,
        });
        self.latest.insert(
            key,
            QuotePrices {
                bid: tick.bid_price_1,
                ask: tick.ask_price_1,
            },
        );
    }

    /// Whether both limit and latest prices are present.
    #[must_use]
    pub fn is_priced(&self, vt_symbol: &str) -> bool {
        self.limits.contains_key(vt_symbol) && self.latest.contains_key(vt_symbol)
    }

    /// Sanitized quote for a priced symbol.
    ///
    /// Some gateway builds push astronomic sentinel values at the limit,
    /// or zero when one side of the book is empty:
    /// * `ask == 0` or `ask > limit_up` collapses to `limit_up`;
    /// * `bid == 0` collapses to `limit_down`;
    /// * `bid > limit_up` (outlier sentinel) collapses to `limit_down`.
    #[must_use]
    pub fn sanitized(&self, vt_symbol: &str) -> Option<SanitizedQuote> {
        let limits = self.limits.get(vt_symbol)?;
        let latest = self.latest.get(vt_symbol)?;

        let ask = if latest.ask == 0.0 {
            limits.limit_up
        } else {
            latest.ask.min(limits.limit_up)
        };

        let bid = if latest.bid == 0.0 {
            limits.limit_down
        } else if latest.bid > limits.limit_up {
            limits.limit_down
        } else {
            latest.bid
        };

        Some(SanitizedQuote {
            bid,
            ask,
            limit_up: limits.limit_up,
            limit_down: limits.limit_down,
        })
    }
}

impl<G: Gateway> FollowEngine<G> {
    /// Convert a request price into a dispatchable limit price.
    ///
    /// With no explicit price (`price == 0`), the quote side selected by
    /// `base_price` seeds the calculation. Market orders and the explicit
    /// `-1` sentinel collapse to the hard limit in the trade direction;
    /// everything else gets the direction-appropriate tick offset and is
    /// clamped to the hard limit.
    pub(crate) fn convert_order_price(
        &self,
        vt_symbol: &str,
        direction: Direction,
        price: f64,
        must_done: bool,
        tick_add: Option<i64>,
        base_price: OrderBasePrice,
    ) -> Result<f64, FollowError> {
        let tick_add = tick_add.unwrap_or(if must_done {
            self.settings.must_done_tick_add
        } else {
            self.settings.tick_add
        });

        let quote = self
            .prices
            .sanitized(vt_symbol)
            .ok_or_else(|| FollowError::UnknownContract {
                vt_symbol: vt_symbol.to_string(),
            })?;
        let contract = self.contract(vt_symbol)?;
        let offset = tick_add as f64 * contract.pricetick;

        let converted = match direction {
            Direction::Long | Direction::Net => {
                let seed = if price == 0.0 {
                    match base_price {
                        OrderBasePrice::GoodForOther => quote.ask,
                        OrderBasePrice::GoodForSelf => quote.bid,
                    }
                } else {
                    price
                };
                if self.settings.order_type == OrderType::Market || seed == -1.0 {
                    quote.limit_up
                } else {
                    (seed + offset).min(quote.limit_up)
                }
            }
            Direction::Short => {
                let seed = if price == 0.0 {
                    match base_price {
                        OrderBasePrice::GoodForOther => quote.bid,
                        OrderBasePrice::GoodForSelf => quote.ask,
                    }
                } else {
                    price
                };
                if self.settings.order_type == OrderType::Market || seed == -1.0 {
                    quote.limit_down
                } else {
                    (seed - offset).max(quote.limit_down)
                }
            }
        };

        Ok(converted)
    }
}
