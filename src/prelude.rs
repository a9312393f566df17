/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 12/11/25
******************************************************************************/

//! Prelude module that re-exports commonly used types and traits.
//!
//! This module provides a convenient way to import the most commonly used
//! types, traits, and functions from the copytrade-rs crate. Instead of
//! importing each type individually, you can use:
//!
//! ```rust
//! use copytrade_rs::prelude::*;
//! ```
//!
//! This will import all the essential types needed for working with the
//! follow engine.

// Engine and bus
pub use crate::follow::bus::{BusMessage, FollowBusStd, FollowBusTokio};
pub use crate::follow::{FollowCommand, FollowEngine, FollowError};

// External collaborator traits and implementations
pub use crate::follow::gateway::Gateway;
pub use crate::follow::offset::{NetPositionConverter, OffsetConverter};

// Event and listener types
pub use crate::follow::events::{LogEvent, LogListener, MarketEvent};
pub use crate::follow::positions::{
    PosDeltaEvent, PosDeltaListener, PosField, PositionBook, PositionEntry,
};

// Settings and persistence
pub use crate::follow::settings::{FollowSettings, Parameter};
pub use crate::follow::store::{DataStore, RunData, RunDataPackage};

// Market data model
pub use crate::follow::types::{
    AccountData, CancelRequest, ContractData, ContractKey, Direction, FollowBaseMode, Offset,
    OrderBasePrice, OrderData, OrderRequest, OrderType, PositionData, RefTag, RunType, Status,
    TickData, TradeData,
};

// Catalog and pricing helpers
pub use crate::follow::catalog::{SymbolCatalog, product_prefix};
pub use crate::follow::pricing::{PriceCache, SanitizedQuote};

// Utility functions
pub use crate::utils::current_time_millis;
