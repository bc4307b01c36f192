//! Packet transport seam.
//!
//! A [`Connector`] opens a [`Transport`] to a server address and registers a
//! single [`PacketHandler`]. Opening only *starts* the connection: the
//! transport connects asynchronously and then invokes the handler once per
//! inbound packet, from a transport-owned thread, in frame order.
//!
//! # Invariants
//!
//! - The handler is never invoked concurrently with itself for one transport
//! - `Closed` is delivered at most once, and nothing follows it
//! - A transport closed through [`Transport::close`] does not deliver `Closed`

mod websocket;

use std::sync::Arc;

use archlink_proto::{ClientPacket, MalformedPacket, ServerPacket};
use thiserror::Error;
pub use websocket::{WebSocketConnector, normalize_address};

/// Something a transport observed.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A decoded packet.
    Packet(ServerPacket),
    /// A packet of known kind that failed to decode.
    Malformed(MalformedPacket),
    /// The connection failed or was closed by the server.
    Closed {
        /// Human-readable cause
        reason: String,
    },
}

/// Inbound callback registered when a transport is opened.
pub type PacketHandler = Arc<dyn Fn(TransportEvent) + Send + Sync>;

/// An open (or opening) connection.
pub trait Transport: Send + Sync {
    /// Queue `packets` to be sent as one frame, preserving their order.
    fn send(&self, packets: Vec<ClientPacket>) -> Result<(), TransportError>;

    /// True once connected and until closed.
    fn is_connected(&self) -> bool;

    /// Close the connection. Idempotent.
    fn close(&self);
}

/// Opens transports.
pub trait Connector: Send + Sync + 'static {
    /// Start connecting to `address`, delivering inbound events to `handler`.
    ///
    /// Returns as soon as the attempt has started. Failures that happen
    /// after this returns are reported as [`TransportEvent::Closed`].
    fn open(
        &self,
        address: &str,
        handler: PacketHandler,
    ) -> Result<Arc<dyn Transport>, TransportError>;
}

/// Transport errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Address could not be turned into a WebSocket URL.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Connection could not be established or was lost.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Outbound packets could not be encoded.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Transport is closed.
    #[error("transport closed")]
    Closed,
}
