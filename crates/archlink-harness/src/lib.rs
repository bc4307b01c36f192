//! Test harness for archlink sessions.
//!
//! An in-process stand-in for an Archipelago server. [`ScriptedServer`]
//! hands out a [`ScriptedConnector`] that a `Session` uses in place of the
//! WebSocket transport. The server answers join and data package requests
//! according to a [`JoinPolicy`], records every batch the client sends, and
//! lets tests push arbitrary packets or drop the connection.
//!
//! Delivery is synchronous on the pushing thread, except the initial
//! `RoomInfo`, which arrives on its own thread so the connecting caller can
//! block on the handshake as it would against a real server.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod scripted_server;
pub mod sink;

pub use fixtures::{CheckedLocations, OffsetMapping, game_data, network_item, player};
pub use scripted_server::{JoinPolicy, ScriptedConnector, ScriptedServer};
pub use sink::RecordingSink;
