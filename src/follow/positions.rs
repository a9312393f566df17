/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/11/25
******************************************************************************/

//! Per-contract position bookkeeping for both accounts.
//!
//! Each contract carries six raw counters (source/target × long/short plus
//! the derived nets) and the follow-specific running values: the operator
//! baseline (`basic_delta`), the day's source traded net (drives the
//! intraday open/close decomposition) and the lost-follow net (open volume
//! that was dispatched but never filled).

use crate::follow::types::{Direction, Offset, PositionData, TradeData};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Position counters for one contract.
///
/// The four raw counters are non-negative in steady state; the signed type
/// tolerates transient re-ordering of trade events. `source_net` /
/// `target_net` / `net_delta` are derived and refreshed on every mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionEntry {
    pub source_long: i64,
    pub source_short: i64,
    pub source_net: i64,
    pub target_long: i64,
    pub target_short: i64,
    pub target_net: i64,
    /// `source_net * multiplier - target_net`, before inverse adjustment.
    pub net_delta: i64,
    /// Operator-declared baseline difference ignored by net sync.
    pub basic_delta: i64,
    /// Running net of today's source trades.
    pub source_traded_net: i64,
    /// Net open volume dispatched but never filled. Signed; short side is
    /// negative.
    pub lost_follow_net: i64,
}

impl PositionEntry {
    /// Recompute the derived nets after a raw-counter mutation.
    fn refresh(&mut self, multiplier: i64) {
        self.source_net = self.source_long - self.source_short;
        self.target_net = self.target_long - self.target_short;
        self.net_delta = self.source_net * multiplier - self.target_net;
    }

    /// True when all four raw counters are zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source_long == 0
            && self.source_short == 0
            && self.target_long == 0
            && self.target_short == 0
    }
}

/// Operator-writable position fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosField {
    SourceLong,
    SourceShort,
    TargetLong,
    TargetShort,
    BasicDelta,
    SourceTradedNet,
    LostFollowNet,
}

/// Snapshot emitted to observers after every position mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PosDeltaEvent {
    /// Canonical contract key.
    pub vt_symbol: String,
    pub source_long: i64,
    pub source_short: i64,
    pub source_net: i64,
    pub target_long: i64,
    pub target_short: i64,
    pub target_net: i64,
    /// Long-leg delta, inverse-adjusted.
    pub long_delta: i64,
    /// Short-leg delta, inverse-adjusted.
    pub short_delta: i64,
    /// Net delta, inverse-adjusted.
    pub net_delta: i64,
    pub basic_delta: i64,
    pub source_traded_net: i64,
    pub lost_follow_net: i64,
}

/// Callback observing position-delta snapshots.
pub type PosDeltaListener = Arc<dyn Fn(&PosDeltaEvent) + Send + Sync>;

/// All position entries, keyed by canonical contract key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionBook {
    entries: HashMap<String, PositionEntry>,
}

impl PositionBook {
    /// Empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `vt_symbol`, if one was ever created.
    #[must_use]
    pub fn get(&self, vt_symbol: &str) -> Option<&PositionEntry> {
        self.entries.get(vt_symbol)
    }

    /// Entry for `vt_symbol`, created zeroed on first mention.
    pub fn entry_mut(&mut self, vt_symbol: &str) -> &mut PositionEntry {
        self.entries.entry(vt_symbol.to_string()).or_default()
    }

    /// Iterate all contract keys currently tracked.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Number of tracked contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no contract is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the whole book (run-data load).
    pub fn replace(&mut self, entries: HashMap<String, PositionEntry>) {
        self.entries = entries;
    }

    /// Clone the raw entries (run-data save).
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, PositionEntry> {
        self.entries.clone()
    }

    /// Overwrite one source leg from a position snapshot. Returns the
    /// contract key on change; `Net` legs are ignored as invalid
    /// composites.
    pub fn apply_source_position(
        &mut self,
        position: &PositionData,
        multiplier: i64,
    ) -> Option<String> {
        if position.direction == Direction::Net {
            return None;
        }
        let key = position.vt_symbol();
        let entry = self.entry_mut(&key);
        match position.direction {
            Direction::Long => entry.source_long = position.volume as i64,
            Direction::Short => entry.source_short = position.volume as i64,
            Direction::Net => unreachable!(),
        }
        entry.refresh(multiplier);
        Some(key)
    }

    /// Overwrite one target leg from a position snapshot. Same contract as
    /// [`Self::apply_source_position`].
    pub fn apply_target_position(
        &mut self,
        position: &PositionData,
        multiplier: i64,
    ) -> Option<String> {
        if position.direction == Direction::Net {
            return None;
        }
        let key = position.vt_symbol();
        let entry = self.entry_mut(&key);
        match position.direction {
            Direction::Long => entry.target_long = position.volume as i64,
            Direction::Short => entry.target_short = position.volume as i64,
            Direction::Net => unreachable!(),
        }
        entry.refresh(multiplier);
        Some(key)
    }

    /// Apply a source fill to the leg inferred from (direction, offset).
    pub fn apply_source_trade(&mut self, trade: &TradeData, multiplier: i64) -> String {
        let key = trade.vt_symbol();
        let volume = trade.volume as i64;
        let entry = self.entry_mut(&key);
        match (trade.direction, trade.offset) {
            (Direction::Long, Offset::Open) => entry.source_long += volume,
            (Direction::Short, Offset::Open) => entry.source_short += volume,
            (Direction::Short, _) => entry.source_long -= volume,
            (Direction::Long, _) => entry.source_short -= volume,
            (Direction::Net, _) => {}
        }
        entry.refresh(multiplier);
        key
    }

    /// Apply a target fill, mirroring [`Self::apply_source_trade`].
    pub fn apply_target_trade(&mut self, trade: &TradeData, multiplier: i64) -> String {
        let key = trade.vt_symbol();
        let volume = trade.volume as i64;
        let entry = self.entry_mut(&key);
        match (trade.direction, trade.offset) {
            (Direction::Long, Offset::Open) => entry.target_long += volume,
            (Direction::Short, Offset::Open) => entry.target_short += volume,
            (Direction::Short, _) => entry.target_long -= volume,
            (Direction::Long, _) => entry.target_short -= volume,
            (Direction::Net, _) => {}
        }
        entry.refresh(multiplier);
        key
    }

    /// Add `delta` to the day's source traded net.
    pub fn add_source_traded_net(&mut self, vt_symbol: &str, delta: i64) {
        self.entry_mut(vt_symbol).source_traded_net += delta;
    }

    /// Set one field and refresh the nets.
    pub fn set_field(&mut self, vt_symbol: &str, field: PosField, value: i64, multiplier: i64) {
        let entry = self.entry_mut(vt_symbol);
        match field {
            PosField::SourceLong => entry.source_long = value,
            PosField::SourceShort => entry.source_short = value,
            PosField::TargetLong => entry.target_long = value,
            PosField::TargetShort => entry.target_short = value,
            PosField::BasicDelta => entry.basic_delta = value,
            PosField::SourceTradedNet => entry.source_traded_net = value,
            PosField::LostFollowNet => entry.lost_follow_net = value,
        }
        entry.refresh(multiplier);
    }

    /// Leg-wise deltas `(long_delta, short_delta)` between the accounts.
    /// Under inverse follow the source legs swap sides.
    #[must_use]
    pub fn pos_delta(
        &self,
        vt_symbol: &str,
        multiplier: i64,
        inverse: bool,
    ) -> Option<(i64, i64)> {
        let entry = self.entries.get(vt_symbol)?;
        let (src_long, src_short) = if inverse {
            (entry.source_short, entry.source_long)
        } else {
            (entry.source_long, entry.source_short)
        };
        Some((
            src_long * multiplier - entry.target_long,
            src_short * multiplier - entry.target_short,
        ))
    }

    /// Net delta between the accounts, sign-inverted under inverse follow.
    #[must_use]
    pub fn net_pos_delta(&self, vt_symbol: &str, multiplier: i64, inverse: bool) -> Option<i64> {
        let entry = self.entries.get(vt_symbol)?;
        let delta = entry.source_net * multiplier - entry.target_net;
        Some(if inverse { -delta } else { delta })
    }

    /// Full observer snapshot for one contract.
    #[must_use]
    pub fn delta_snapshot(
        &self,
        vt_symbol: &str,
        multiplier: i64,
        inverse: bool,
    ) -> Option<PosDeltaEvent> {
        let entry = self.entries.get(vt_symbol)?;
        let (long_delta, short_delta) = self.pos_delta(vt_symbol, multiplier, inverse)?;
        let net_delta = self.net_pos_delta(vt_symbol, multiplier, inverse)?;
        Some(PosDeltaEvent {
            vt_symbol: vt_symbol.to_string(),
            source_long: entry.source_long,
            source_short: entry.source_short,
            source_net: entry.source_net,
            target_long: entry.target_long,
            target_short: entry.target_short,
            target_net: entry.target_net,
            long_delta,
            short_delta,
            net_delta,
            basic_delta: entry.basic_delta,
            source_traded_net: entry.source_traded_net,
            lost_follow_net: entry.lost_follow_net,
        })
    }

    /// Drop entries whose four raw counters are all zero. Returns the
    /// removed keys.
    pub fn clear_empty(&mut self) -> Vec<String> {
        let removed: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.is_empty())
            .map(|(k, _)| k.clone())
            .collect();
        for key in &removed {
            self.entries.remove(key);
        }
        removed
    }

    /// Drop entries for contracts no longer known to the catalog (expired).
    /// Returns the removed keys.
    pub fn clear_expired<F>(&mut self, mut known: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool,
    {
        let removed: Vec<String> = self
            .entries
            .keys()
            .filter(|k| !known(k.as_str()))
            .cloned()
            .collect();
        for key in &removed {
            self.entries.remove(key);
        }
        removed
    }

    /// Zero every contract's day-local source traded net (end-of-session
    /// clear).
    pub fn reset_source_traded_net(&mut self) {
        for entry in self.entries.values_mut() {
            entry.source_traded_net = 0;
        }
    }
}
