//! Settings / run-data persistence, history snapshots and CSV exports.
//!
//! Everything lives under one data directory:
//!
//! ```text
//! <root>/follow_trading_setting.json     settings document
//! <root>/follow_trading_data.json        run-data document
//! <root>/follow_history/YYYYMMDD_follow_trading_data.json
//! <root>/trade/trade_YYYYMMDD.csv        accumulated fills
//! <root>/account_info.csv                daily account snapshots
//! ```
//!
//! Documents are replaced atomically (write to `<file>.tmp`, then rename)
//! so a crash mid-write never leaves a torn JSON file behind.

use crate::follow::error::FollowError;
use crate::follow::positions::PositionEntry;
use crate::follow::settings::FollowSettings;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

const SETTING_FILENAME: &str = "follow_trading_setting.json";
const DATA_FILENAME: &str = "follow_trading_data.json";
const HISTORY_DIR: &str = "follow_history";
const TRADE_DIR: &str = "trade";
const ACCOUNT_FILENAME: &str = "account_info.csv";

/// Format version used for checksum-wrapped history snapshots.
pub const RUN_DATA_FORMAT_VERSION: u32 = 1;

/// The run-data document: the signal-to-children map plus the position
/// book. This is everything the engine needs back after a restart to
/// recognize already-followed signals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunData {
    /// signal id -> dispatched child order ids.
    pub signal_orderids: HashMap<String, Vec<String>>,
    /// Canonical contract key -> position entry.
    pub positions: HashMap<String, PositionEntry>,
}

/// Wrapper that provides checksum validation for archived run data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDataPackage {
    /// Version of the snapshot schema for forward compatibility.
    pub version: u32,
    /// Snapshot payload.
    pub data: RunData,
    /// Hex-encoded SHA-256 of the serialized payload.
    pub checksum: String,
}

impl RunDataPackage {
    /// Create a new package computing the checksum of the payload.
    pub fn new(data: RunData) -> Result<Self, FollowError> {
        let checksum = Self::compute_checksum(&data)?;
        Ok(Self {
            version: RUN_DATA_FORMAT_VERSION,
            data,
            checksum,
        })
    }

    /// Validate the version and checksum.
    pub fn validate(&self) -> Result<(), FollowError> {
        if self.version != RUN_DATA_FORMAT_VERSION {
            return Err(FollowError::UnsupportedVersion {
                found: self.version,
                expected: RUN_DATA_FORMAT_VERSION,
            });
        }
        let computed = Self::compute_checksum(&self.data)?;
        if computed != self.checksum {
            return Err(FollowError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual: computed,
            });
        }
        Ok(())
    }

    /// Consume the package and return the validated payload.
    pub fn into_data(self) -> Result<RunData, FollowError> {
        self.validate()?;
        Ok(self.data)
    }

    fn compute_checksum(data: &RunData) -> Result<String, FollowError> {
        let payload = serde_json::to_vec(data).map_err(|e| FollowError::Serialization {
            message: e.to_string(),
        })?;
        let mut hasher = Sha256::new();
        hasher.update(payload);
        Ok(hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<String>())
    }
}

/// One row of the daily trade CSV.
#[derive(Debug, Clone, Serialize)]
pub struct TradeCsvRow {
    pub date: String,
    pub dt: String,
    pub gateway_name: String,
    pub tradeid: String,
    pub orderid: String,
    pub symbol: String,
    pub exchange: String,
    pub direction: String,
    pub offset: String,
    pub price: f64,
    pub volume: u64,
    /// `source` or `target`, derived from the gateway name.
    pub account_type: String,
    pub account_id: String,
}

/// One row of the daily account snapshot CSV.
#[derive(Debug, Clone, Serialize)]
pub struct AccountCsvRow {
    pub date: String,
    pub account_id: String,
    pub balance: f64,
    pub available: f64,
}

/// File-backed store rooted at one data directory.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FollowError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| FollowError::io(e, &root))?;
        Ok(Self { root })
    }

    /// The store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn settings_path(&self) -> PathBuf {
        self.root.join(SETTING_FILENAME)
    }

    fn run_data_path(&self) -> PathBuf {
        self.root.join(DATA_FILENAME)
    }

    fn history_path(&self, date: &str) -> PathBuf {
        self.root
            .join(HISTORY_DIR)
            .join(format!("{date}_{DATA_FILENAME}"))
    }

    fn trade_path(&self, date: &str) -> PathBuf {
        self.root.join(TRADE_DIR).join(format!("trade_{date}.csv"))
    }

    fn account_path(&self) -> PathBuf {
        self.root.join(ACCOUNT_FILENAME)
    }

    /// Load the settings document; a missing file yields defaults.
    pub fn load_settings(&self) -> Result<FollowSettings, FollowError> {
        self.load_json(&self.settings_path())
    }

    /// Replace the settings document.
    pub fn save_settings(&self, settings: &FollowSettings) -> Result<(), FollowError> {
        self.save_json(&self.settings_path(), settings)
    }

    /// Load the run-data document; a missing file yields an empty document.
    pub fn load_run_data(&self) -> Result<RunData, FollowError> {
        self.load_json(&self.run_data_path())
    }

    /// Replace the run-data document.
    pub fn save_run_data(&self, data: &RunData) -> Result<(), FollowError> {
        self.save_json(&self.run_data_path(), data)
    }

    /// Snapshot run data into the dated history file, checksum-wrapped.
    /// Returns `false` without touching anything when today's snapshot
    /// already exists.
    pub fn archive_run_data(&self, data: &RunData, date: &str) -> Result<bool, FollowError> {
        let path = self.history_path(date);
        if path.exists() {
            return Ok(false);
        }
        let package = RunDataPackage::new(data.clone())?;
        self.save_json(&path, &package)?;
        Ok(true)
    }

    /// Load and validate one dated history snapshot.
    pub fn load_archived_run_data(&self, date: &str) -> Result<RunData, FollowError> {
        let path = self.history_path(date);
        let package: RunDataPackage = self.load_json_required(&path)?;
        package.into_data()
    }

    /// Replace the dated trade CSV with `rows`.
    pub fn write_trades(&self, date: &str, rows: &[TradeCsvRow]) -> Result<(), FollowError> {
        let path = self.trade_path(date);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| FollowError::io(e, parent))?;
        }
        let mut writer = csv::Writer::from_path(&path).map_err(|e| FollowError::Io {
            message: e.to_string(),
            path: Some(path.clone()),
        })?;
        for row in rows {
            writer.serialize(row).map_err(|e| FollowError::Serialization {
                message: e.to_string(),
            })?;
        }
        writer.flush().map_err(|e| FollowError::io(e, &path))?;
        debug!(rows = rows.len(), path = %path.display(), "trade csv written");
        Ok(())
    }

    /// Append today's account snapshots to the account-info CSV. The file
    /// carries no header; one row per account per day accumulates over
    /// time.
    pub fn append_account_info(&self, rows: &[AccountCsvRow]) -> Result<(), FollowError> {
        let path = self.account_path();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| FollowError::io(e, &path))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        for row in rows {
            writer.serialize(row).map_err(|e| FollowError::Serialization {
                message: e.to_string(),
            })?;
        }
        writer.flush().map_err(|e| FollowError::io(e, &path))?;
        Ok(())
    }

    fn load_json<T>(&self, path: &Path) -> Result<T, FollowError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if !path.exists() {
            return Ok(T::default());
        }
        self.load_json_required(path)
    }

    fn load_json_required<T>(&self, path: &Path) -> Result<T, FollowError>
    where
        T: serde::de::DeserializeOwned,
    {
        let content = fs::read_to_string(path).map_err(|e| FollowError::io(e, path))?;
        serde_json::from_str(&content).map_err(|e| FollowError::Deserialization {
            message: e.to_string(),
        })
    }

    fn save_json<T>(&self, path: &Path, value: &T) -> Result<(), FollowError>
    where
        T: Serialize,
    {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| FollowError::io(e, parent))?;
        }
        let content =
            serde_json::to_string_pretty(value).map_err(|e| FollowError::Serialization {
                message: e.to_string(),
            })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| FollowError::io(e, &tmp))?;
        fs::rename(&tmp, path).map_err(|e| FollowError::io(e, path))?;
        Ok(())
    }
}
