//! Error types for archlink core.
//!
//! Handshake failures are the only errors a caller ever sees from a session;
//! they are carried as values inside a connection result. Index divergence and
//! lookup misses are not errors at all: the former triggers a resync, the
//! latter degrades to the raw id.

use std::time::Duration;

use thiserror::Error;

/// Why a connect attempt failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// No terminal handshake packet arrived before the deadline.
    #[error("connection timed out after {elapsed:?}")]
    Timeout {
        /// How long we waited
        elapsed: Duration,
    },

    /// Server refused the join request.
    #[error("{}", .reasons.join(", "))]
    Refused {
        /// Server-supplied reasons, in server order
        reasons: Vec<String>,
    },

    /// Server answered with something other than accept or refuse.
    #[error("unknown packet, probably due to version mismatch")]
    ProtocolMismatch,

    /// Transport could not be opened or dropped mid-handshake.
    #[error("transport error: {0}")]
    Transport(String),
}

impl HandshakeError {
    /// Returns true if retrying the same connect may succeed.
    ///
    /// Refusals and protocol mismatches need a configuration change first.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport(_))
    }
}

/// Errors from loading or saving the data package cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Filesystem failure.
    #[error("cache I/O error: {0}")]
    Io(String),

    /// Cache contents could not be (de)serialized.
    #[error("cache format error: {0}")]
    Format(String),
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}
