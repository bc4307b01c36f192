//! Session errors.
//!
//! Returned by the caller-facing write operations (`report_checked`,
//! `set_status`, ...). None of them are fatal to the session: a failed
//! report is simply not sent this cycle.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors from session write operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No open transport. `report_checked` returns this only when no connect
    /// was ever made, since otherwise it reconnects first.
    #[error("not connected")]
    NotConnected,

    /// Transport rejected the send.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
