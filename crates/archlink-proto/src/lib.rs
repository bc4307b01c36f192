//! Archipelago wire protocol.
//!
//! Typed packets exchanged between a game client and an Archipelago
//! multiworld server, plus the frame codec that maps them onto WebSocket text
//! frames.
//!
//! # Components
//!
//! - [`ClientPacket`]: packets the client sends (join request, checks, sync)
//! - [`ServerPacket`]: packets the server sends (room info, items, chat)
//! - [`JsonMessagePart`]: one fragment of a rich-text `PrintJSON` message
//! - [`encode_frame`] / [`decode_frame`]: JSON array framing
//!
//! Every frame carries a JSON array of packet objects, each discriminated by
//! its `cmd` field. Decoding is per packet so that one malformed or unknown
//! packet never poisons the rest of the frame.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod frame;
pub mod ids;
pub mod message;
pub mod packet;

pub use errors::{ProtocolError, Result};
pub use frame::{InboundPacket, MalformedPacket, decode_frame, encode_frame};
pub use ids::{ItemId, LocationId, SlotId};
pub use message::{JsonMessagePart, MessageColor, PartKind};
pub use packet::{
    ClientPacket, ClientStatus, ConnectedPacket, DataPackageContents, GameData, NetworkItem,
    NetworkPlayer, NetworkVersion, RoomInfoPacket, RoomUpdatePacket, ServerPacket,
};
