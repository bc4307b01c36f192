//! Archipelago session client.
//!
//! Keeps a live session with a multiworld server: performs the blocking
//! connect handshake, dispatches inbound packets, maintains the received item
//! log (resynchronizing on index divergence), and reports checked locations,
//! reconnecting on demand.
//!
//! # Architecture
//!
//! ```text
//! caller ──connect/report──> Session ──send──> dyn Transport ──frames──> server
//!                               ^                    │
//!                               └──TransportEvent────┘ (transport thread)
//! ```
//!
//! The transport is a seam: [`WebSocketConnector`] talks to a real server,
//! the harness crate supplies a scripted in-process one for tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod presenter;
pub mod result;
pub mod session;
pub mod transport;

pub use config::ClientConfig;
pub use error::SessionError;
pub use presenter::{Color, LogLine, LogSink, Presenter, Segment, TracingSink};
pub use result::{ConnectedInfo, ConnectionResult};
pub use session::{CheckedLocationsProvider, ConnectionState, Session};
pub use transport::{
    Connector, PacketHandler, Transport, TransportError, TransportEvent, WebSocketConnector,
};
