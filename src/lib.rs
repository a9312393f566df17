//! # Trade-Follower Engine
//!
//! A trade-follower (copy-trading) engine for futures accounts written in Rust. The library sits between two broker gateways: it subscribes to the order and trade stream of a *source* account (the signal) and reproduces equivalent orders on a *target* account, applying volume transformation, risk filters and full post-send lifecycle management.
//!
//! ## Key Features
//!
//! - **Signal Filtering**: An ordered predicate pipeline (volume whitelist, contract blacklist, already-followed guard, event-age timeout) decides which source events become follow intents. The first failing predicate drops the signal with its name as the logged reason.
//!
//! - **Order Transformation**: Volume multipliers, direction inversion, intraday open/close decomposition against the day's running net, close rewriting against actual target holdings, and per-product volume splitting.
//!
//! - **Lifecycle Management**: Every working follow order is tracked with a per-tick elapsed counter. Orders that sit unfilled past their timeout are cancelled (bounded attempts); must-done orders can be *chased* — cancelled and resent at a more aggressive price up to a configurable budget, optionally leaving one final resting replacement.
//!
//! - **Position Bookkeeping**: Six counters per contract (source/target × long/short plus derived nets), updated from both trade and position events, with loss-follow accounting for open orders that died unfilled.
//!
//! - **Manual Synchronization**: Leg-wise, combined and net-delta planners reconcile the target account to the source on demand, flowing through the same dispatch pipeline as regular follows.
//!
//! - **Persistence**: Settings and run data live in JSON documents replaced atomically on every mutation; daily history snapshots are checksum-wrapped, and trade/account history is exported as CSV at end of session.
//!
//! ## Architecture
//!
//! The engine is a single-threaded cooperative event consumer. Gateways
//! push typed events (tick, order, trade, position, timer) onto a
//! single-consumer bus from their own threads; one loop owns every mutable
//! table and drains the bus in arrival order. Nothing else mutates engine
//! state — operators act through a typed command surface delivered over
//! the same bus.
//!
//! ```text
//! ┌──────────────┐   events    ┌─────────────────┐   orders    ┌──────────────┐
//! │ source       │ ──────────► │   FollowEngine  │ ──────────► │ target       │
//! │ gateway      │             │  filter/build/  │             │ gateway      │
//! │ (signal)     │             │  dispatch/track │ ◄────────── │ (follower)   │
//! └──────────────┘             └─────────────────┘   status    └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use copytrade_rs::prelude::*;
//! use std::sync::Arc;
//!
//! let store = DataStore::open("copytrade-data")?;
//! let gateway = Arc::new(MyGatewayRouter::connect()?);
//! let mut engine = FollowEngine::new(
//!     store,
//!     gateway,
//!     Box::new(NetPositionConverter::new()),
//! )?;
//! engine.init();
//!
//! let mut bus = FollowBusStd::new();
//! let sender = bus.sender();
//! bus.start_timer(std::time::Duration::from_secs(1));
//! let handle = bus.start(engine);
//!
//! sender.send(BusMessage::Command(FollowCommand::Start))?;
//! // feed gateway events through `sender` ...
//! ```
//!
//! ## Status
//!
//! The engine core is feature-complete; broker adapters and UI shells are
//! external and connect through the [`follow::Gateway`] trait and the
//! listener callbacks.

pub mod follow;
pub mod prelude;
mod utils;

pub use follow::bus::{BusMessage, FollowBusStd, FollowBusTokio};
pub use follow::gateway::Gateway;
pub use follow::offset::{NetPositionConverter, OffsetConverter};
pub use follow::positions::{PosDeltaEvent, PosField, PositionBook, PositionEntry};
pub use follow::settings::{FollowSettings, Parameter};
pub use follow::store::{DataStore, RunData, RunDataPackage};
pub use follow::{FollowCommand, FollowEngine, FollowError, LogEvent, MarketEvent};
pub use utils::current_time_millis;
