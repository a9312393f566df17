//! Inbound event model and outbound listener types.

use crate::follow::types::{OrderData, PositionData, TickData, TradeData};
use std::sync::Arc;

/// One event delivered by the host event bus.
///
/// Gateways may produce these from their own threads; pushing them onto the
/// bus is the only cross-thread action. The engine consumes them one at a
/// time on its run loop.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEvent {
    /// Top-of-book update.
    Tick(TickData),
    /// Order status push.
    Order(OrderData),
    /// Fill push.
    Trade(TradeData),
    /// Position snapshot for one leg.
    Position(PositionData),
    /// Periodic timer, roughly one per second. Drives the send queue,
    /// timeout cancellation and the end-of-session autosave.
    Timer,
}

/// Operator-visible log line emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub message: String,
    /// Unix timestamp in milliseconds when the line was emitted.
    pub timestamp: u64,
}

impl LogEvent {
    /// Wrap a message, stamped with the current time.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: crate::utils::current_time_millis(),
        }
    }
}

/// Callback observing engine log lines, e.g. to mirror them into a UI.
pub type LogListener = Arc<dyn Fn(&LogEvent) + Send + Sync>;
