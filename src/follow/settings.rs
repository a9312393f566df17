//! Engine parameters and the typed parameter-mutation command.

use crate::follow::types::{FollowBaseMode, OrderBasePrice, OrderType, RunType};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All tunable parameters of the follow engine.
///
/// The struct is the settings document: it serializes field-per-field to
/// JSON with enums as snake_case tags, and a file missing any field falls
/// back to that field's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowSettings {
    /// Gateway whose orders/trades are the signal.
    pub source_gateway: String,
    /// Gateway that receives follow orders.
    pub target_gateway: String,

    /// Maximum age in seconds of a signal event before it is dropped.
    pub follow_timeout: i64,
    /// Seconds a working follow order may sit unfilled before the first
    /// cancel.
    pub cancel_order_timeout: u32,
    /// Maximum cancel attempts per order before the tracker gives up.
    pub max_cancel: u32,
    /// Volume multiplier applied to every follow order.
    pub multiplier: i64,
    /// Follow source orders or source trades.
    pub follow_based: FollowBaseMode,

    /// Base price side for regular follow orders.
    pub order_base_price: OrderBasePrice,
    /// Base price side for manual-sync orders.
    pub sync_base_price: OrderBasePrice,

    /// Tick offset for ordinary follow orders.
    pub tick_add: i64,
    /// Tick offset for must-done orders (closes, syncs).
    pub must_done_tick_add: i64,

    /// Enable the cancel-and-resend chase loop for must-done orders.
    pub chase_order: bool,
    /// Chase price chains off the previous order's price instead of fresh
    /// market data.
    pub chase_base_last_order_price: bool,
    /// Base price side for chase resends priced from market data.
    pub chase_base_price: OrderBasePrice,
    /// Tick offset for chase resends.
    pub chase_order_tick_add: i64,
    /// Seconds a chase resend may sit unfilled before the next cancel.
    pub chase_order_timeout: u32,
    /// Maximum resends per original order.
    pub chase_max_resend: u32,
    /// After the chase budget is exhausted, leave one final untracked
    /// replacement working instead of giving up.
    pub keep_order_after_chase: bool,

    /// Decompose source trades into open/close legs against the day's
    /// running net.
    pub intraday_trading: bool,
    /// Follow with the opposite direction.
    pub inverse_follow: bool,
    /// Price type of outbound orders.
    pub order_type: OrderType,

    /// Global per-order volume cap; larger requests are split.
    pub single_max: u64,
    /// Per-product volume caps overriding `single_max`.
    pub single_max_by_product: HashMap<String, u64>,

    /// Product prefixes traded in broker-locked intraday mode.
    pub intraday_symbols: Vec<String>,
    /// Contracts never followed.
    pub skip_contracts: Vec<String>,

    /// Only follow signals whose originating order volume is whitelisted.
    pub filter_order_volume: bool,
    /// The volume whitelist.
    pub order_volumes_to_follow: Vec<u64>,

    /// Live or test clock behavior.
    pub run_type: RunType,
    /// Contract subscribed at init in test mode to drive the clock.
    pub test_symbol: String,

    /// End of the daylight session; start of the save window.
    pub daylight_end: NaiveTime,
    /// Start of the night session; end of the save window.
    pub night_begin: NaiveTime,
}

impl Default for FollowSettings {
    fn default() -> Self {
        Self {
            source_gateway: "CTP".to_string(),
            target_gateway: "RPC".to_string(),
            follow_timeout: 60,
            cancel_order_timeout: 10,
            max_cancel: 3,
            multiplier: 1,
            follow_based: FollowBaseMode::BaseTrade,
            order_base_price: OrderBasePrice::GoodForOther,
            sync_base_price: OrderBasePrice::GoodForOther,
            tick_add: 5,
            must_done_tick_add: 25,
            chase_order: false,
            chase_base_last_order_price: true,
            chase_base_price: OrderBasePrice::GoodForSelf,
            chase_order_tick_add: 5,
            chase_order_timeout: 10,
            chase_max_resend: 3,
            keep_order_after_chase: false,
            intraday_trading: false,
            inverse_follow: false,
            order_type: OrderType::Limit,
            single_max: 1000,
            single_max_by_product: HashMap::from([
                ("IF".to_string(), 20),
                ("IC".to_string(), 20),
                ("IH".to_string(), 20),
            ]),
            intraday_symbols: Vec::new(),
            skip_contracts: Vec::new(),
            filter_order_volume: true,
            order_volumes_to_follow: vec![1, 2],
            run_type: RunType::Live,
            test_symbol: String::new(),
            daylight_end: NaiveTime::from_hms_opt(15, 2, 0).expect("valid time"),
            night_begin: NaiveTime::from_hms_opt(20, 45, 0).expect("valid time"),
        }
    }
}

impl FollowSettings {
    /// Per-order volume cap for `product`: the smaller of the product
    /// override and the global cap.
    #[must_use]
    pub fn order_max(&self, product: &str) -> u64 {
        self.single_max_by_product
            .get(product)
            .copied()
            .unwrap_or(self.single_max)
            .min(self.single_max)
    }
}

/// One parameter mutation, as a tagged command rather than a string-keyed
/// assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "name", content = "value")]
pub enum Parameter {
    SourceGateway(String),
    TargetGateway(String),
    FollowTimeout(i64),
    CancelOrderTimeout(u32),
    MaxCancel(u32),
    Multiplier(i64),
    FollowBased(FollowBaseMode),
    OrderBasePrice(OrderBasePrice),
    SyncBasePrice(OrderBasePrice),
    TickAdd(i64),
    MustDoneTickAdd(i64),
    ChaseOrder(bool),
    ChaseBaseLastOrderPrice(bool),
    ChaseBasePrice(OrderBasePrice),
    ChaseOrderTickAdd(i64),
    ChaseOrderTimeout(u32),
    ChaseMaxResend(u32),
    KeepOrderAfterChase(bool),
    IntradayTrading(bool),
    InverseFollow(bool),
    OrderType(OrderType),
    SingleMax(u64),
    SingleMaxByProduct(HashMap<String, u64>),
    IntradaySymbols(Vec<String>),
    SkipContracts(Vec<String>),
    FilterOrderVolume(bool),
    OrderVolumesToFollow(Vec<u64>),
    RunType(RunType),
    TestSymbol(String),
    DaylightEnd(NaiveTime),
    NightBegin(NaiveTime),
}

impl Parameter {
    /// Apply this mutation to a settings struct.
    pub fn apply(self, settings: &mut FollowSettings) {
        match self {
            Parameter::SourceGateway(v) => settings.source_gateway = v,
            Parameter::TargetGateway(v) => settings.target_gateway = v,
            Parameter::FollowTimeout(v) => settings.follow_timeout = v,
            Parameter::CancelOrderTimeout(v) => settings.cancel_order_timeout = v,
            Parameter::MaxCancel(v) => settings.max_cancel = v,
            Parameter::Multiplier(v) => settings.multiplier = v,
            Parameter::FollowBased(v) => settings.follow_based = v,
            Parameter::OrderBasePrice(v) => settings.order_base_price = v,
            Parameter::SyncBasePrice(v) => settings.sync_base_price = v,
            Parameter::TickAdd(v) => settings.tick_add = v,
            Parameter::MustDoneTickAdd(v) => settings.must_done_tick_add = v,
            Parameter::ChaseOrder(v) => settings.chase_order = v,
            Parameter::ChaseBaseLastOrderPrice(v) => settings.chase_base_last_order_price = v,
            Parameter::ChaseBasePrice(v) => settings.chase_base_price = v,
            Parameter::ChaseOrderTickAdd(v) => settings.chase_order_tick_add = v,
            Parameter::ChaseOrderTimeout(v) => settings.chase_order_timeout = v,
            Parameter::ChaseMaxResend(v) => settings.chase_max_resend = v,
            Parameter::KeepOrderAfterChase(v) => settings.keep_order_after_chase = v,
            Parameter::IntradayTrading(v) => settings.intraday_trading = v,
            Parameter::InverseFollow(v) => settings.inverse_follow = v,
            Parameter::OrderType(v) => settings.order_type = v,
            Parameter::SingleMax(v) => settings.single_max = v,
            Parameter::SingleMaxByProduct(v) => settings.single_max_by_product = v,
            Parameter::IntradaySymbols(v) => settings.intraday_symbols = v,
            Parameter::SkipContracts(v) => settings.skip_contracts = v,
            Parameter::FilterOrderVolume(v) => settings.filter_order_volume = v,
            Parameter::OrderVolumesToFollow(v) => settings.order_volumes_to_follow = v,
            Parameter::RunType(v) => settings.run_type = v,
            Parameter::TestSymbol(v) => settings.test_symbol = v,
            Parameter::DaylightEnd(v) => settings.daylight_end = v,
            Parameter::NightBegin(v) => settings.night_begin = v,
        }
    }
}
