//! Follow engine error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur within the follow engine.
///
/// Event handlers never propagate these to the caller of the event loop;
/// the engine converts them into log output and drops the offending event,
/// leaving the state tables untouched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FollowError {
    /// An I/O error occurred while reading or writing a data file.
    #[error("io error: {message} ({path:?})")]
    Io {
        /// The underlying I/O error message.
        message: String,
        /// The file path involved, if known.
        path: Option<PathBuf>,
    },

    /// A document could not be serialized.
    #[error("serialization error: {message}")]
    Serialization {
        /// The underlying serialization error message.
        message: String,
    },

    /// A document could not be deserialized.
    #[error("deserialization error: {message}")]
    Deserialization {
        /// The underlying deserialization error message.
        message: String,
    },

    /// A history snapshot failed integrity verification.
    #[error("checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch {
        /// Checksum recorded in the snapshot package.
        expected: String,
        /// Checksum computed from the payload.
        actual: String,
    },

    /// A history snapshot was written by an unsupported schema version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },

    /// A signal event carried values that can never be followed
    /// (`offset = none` or `direction = net`).
    #[error("malformed signal {id}: {reason}")]
    MalformedSignal {
        /// Trade or order id of the event.
        id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// No contract metadata is available for a symbol.
    #[error("unknown contract {vt_symbol}")]
    UnknownContract {
        /// Canonical contract key.
        vt_symbol: String,
    },

    /// The gateway returned no order id for a send.
    #[error("gateway rejected order for {vt_symbol}")]
    SendRejected {
        /// Canonical contract key of the rejected request.
        vt_symbol: String,
    },

    /// A close was requested but the target account holds nothing to close.
    #[error("target holding shortage for {vt_symbol}")]
    TargetShortage {
        /// Canonical contract key.
        vt_symbol: String,
    },

    /// A cancel referenced an order the gateway does not know.
    #[error("cancel failed, unknown order {orderid}")]
    UnknownOrder {
        /// The order id that could not be resolved.
        orderid: String,
    },
}

impl FollowError {
    /// Wrap an I/O error with its file path.
    pub(crate) fn io(error: std::io::Error, path: impl Into<PathBuf>) -> Self {
        FollowError::Io {
            message: error.to_string(),
            path: Some(path.into()),
        }
    }
}
