//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding frames.
///
/// Only frame-level problems surface here. A single bad packet inside an
/// otherwise valid frame is reported as a
/// [`MalformedPacket`](crate::MalformedPacket) instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame text is not valid JSON.
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),

    /// The frame is valid JSON but not an array of packets.
    #[error("frame is not a packet array (found {found})")]
    NotAnArray {
        /// JSON type that was found instead
        found: &'static str,
    },

    /// Outbound packets could not be serialized.
    #[error("failed to encode packets: {0}")]
    Encode(String),
}
