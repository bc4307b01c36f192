//! Protocol packets for client-server communication.
//!
//! Two enums define the protocol vocabulary this client speaks:
//! - [`ClientPacket`]: sent by the client to the multiworld server.
//! - [`ServerPacket`]: sent by the server to the client.
//!
//! Both are internally tagged by `cmd`, matching the server's JSON shape. The
//! server enum ends in a catch-all [`ServerPacket::Unknown`] so that packet
//! kinds added by newer servers are ignored instead of failing the frame.

use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};

use crate::{
    ids::{ItemId, LocationId, SlotId},
    message::JsonMessagePart,
};

/// Packets sent by the client.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "cmd")]
pub enum ClientPacket {
    /// Join request, sent in response to `RoomInfo`.
    Connect {
        /// Room password (empty if none).
        password: String,
        /// Game identifier the slot was generated for.
        game: String,
        /// Slot name to join as.
        name: String,
        /// Stable client instance id.
        uuid: String,
        /// Client protocol version.
        version: NetworkVersion,
        /// Bit flags selecting which items the server should send us.
        items_handling: u8,
        /// Capability tags.
        tags: Vec<String>,
        /// Whether the server should include slot data in `Connected`.
        slot_data: bool,
    },
    /// Ask the server to resend the full received item log.
    Sync,
    /// Report locations as checked.
    LocationChecks {
        /// Server-recognized location ids, in report order.
        locations: Vec<LocationId>,
    },
    /// Ask what items sit at the given locations.
    LocationScouts {
        /// Locations to scout.
        locations: Vec<LocationId>,
        /// 0 = no hint, 1 = create hint, 2 = create hint only if new.
        create_as_hint: u8,
    },
    /// Report the client's game state.
    StatusUpdate {
        /// New state.
        status: ClientStatus,
    },
    /// Request data package tables.
    GetDataPackage {
        /// Restrict the reply to these games.
        #[serde(skip_serializing_if = "Option::is_none")]
        games: Option<Vec<String>>,
        /// Omit these games from the reply.
        #[serde(skip_serializing_if = "Option::is_none")]
        exclusions: Option<Vec<String>>,
    },
    /// Chat message.
    Say {
        /// Message text.
        text: String,
    },
}

impl ClientPacket {
    /// Packet kind as it appears in the `cmd` field.
    pub fn cmd(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "Connect",
            Self::Sync => "Sync",
            Self::LocationChecks { .. } => "LocationChecks",
            Self::LocationScouts { .. } => "LocationScouts",
            Self::StatusUpdate { .. } => "StatusUpdate",
            Self::GetDataPackage { .. } => "GetDataPackage",
            Self::Say { .. } => "Say",
        }
    }
}

/// Packets sent by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "cmd")]
pub enum ServerPacket {
    /// Full room description, sent on connect.
    RoomInfo(RoomInfoPacket),
    /// Partial room update (membership, checks, hint points).
    RoomUpdate(RoomUpdatePacket),
    /// Data package tables.
    DataPackage {
        /// Package contents.
        data: DataPackageContents,
    },
    /// Join request refused.
    ConnectionRefused {
        /// Server-supplied reasons.
        #[serde(default)]
        errors: Vec<String>,
    },
    /// Join request accepted.
    Connected(ConnectedPacket),
    /// Reply to `LocationScouts`.
    LocationInfo {
        /// Items at the scouted locations.
        locations: Vec<NetworkItem>,
    },
    /// Items received by this slot.
    ReceivedItems {
        /// Index of the first item in `items` within the full log.
        index: usize,
        /// Items in server order.
        items: Vec<NetworkItem>,
    },
    /// Plain text message.
    Print {
        /// Message text, possibly multi-line.
        #[serde(default)]
        text: Option<String>,
    },
    /// Rich text message.
    #[serde(rename = "PrintJSON")]
    PrintJson {
        /// Message fragments.
        data: Vec<JsonMessagePart>,
        /// Message category (`ItemSend`, `Chat`, ...).
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
    /// Any packet kind this client does not understand.
    #[serde(other)]
    Unknown,
}

impl ServerPacket {
    /// Packet kind name, for logging.
    pub fn cmd(&self) -> &'static str {
        match self {
            Self::RoomInfo(_) => "RoomInfo",
            Self::RoomUpdate(_) => "RoomUpdate",
            Self::DataPackage { .. } => "DataPackage",
            Self::ConnectionRefused { .. } => "ConnectionRefused",
            Self::Connected(_) => "Connected",
            Self::LocationInfo { .. } => "LocationInfo",
            Self::ReceivedItems { .. } => "ReceivedItems",
            Self::Print { .. } => "Print",
            Self::PrintJson { .. } => "PrintJSON",
            Self::Unknown => "Unknown",
        }
    }
}

/// Body of a `RoomInfo` packet.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RoomInfoPacket {
    /// Server protocol version.
    #[serde(default)]
    pub version: Option<NetworkVersion>,
    /// Server capability tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the room requires a password.
    #[serde(default)]
    pub password: bool,
    /// Games present in the room.
    #[serde(default)]
    pub games: Vec<String>,
    /// Current data package checksum per game.
    #[serde(default)]
    pub datapackage_checksums: HashMap<String, String>,
    /// Seed name of the generated multiworld.
    #[serde(default)]
    pub seed_name: String,
    /// Players currently in the room.
    #[serde(default)]
    pub players: Vec<NetworkPlayer>,
}

/// Body of a `RoomUpdate` packet. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RoomUpdatePacket {
    /// Updated player list.
    #[serde(default)]
    pub players: Option<Vec<NetworkPlayer>>,
    /// Newly checked locations for this slot.
    #[serde(default)]
    pub checked_locations: Option<Vec<LocationId>>,
    /// Updated hint point balance.
    #[serde(default)]
    pub hint_points: Option<i64>,
}

/// Body of a `Connected` packet.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ConnectedPacket {
    /// Team of the assigned slot.
    #[serde(default)]
    pub team: i32,
    /// Assigned slot.
    pub slot: SlotId,
    /// Players in the room.
    #[serde(default)]
    pub players: Vec<NetworkPlayer>,
    /// Locations of this slot not yet checked.
    #[serde(default)]
    pub missing_locations: Vec<LocationId>,
    /// Locations of this slot already checked.
    #[serde(default)]
    pub checked_locations: Vec<LocationId>,
    /// Game-specific slot data.
    #[serde(default)]
    pub slot_data: serde_json::Value,
}

/// Data package payload.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DataPackageContents {
    /// Tables per game name.
    #[serde(default)]
    pub games: HashMap<String, GameData>,
}

/// Name tables for one game.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GameData {
    /// Item name to id.
    #[serde(default)]
    pub item_name_to_id: HashMap<String, ItemId>,
    /// Location name to id.
    #[serde(default)]
    pub location_name_to_id: HashMap<String, LocationId>,
    /// Content checksum of these tables.
    #[serde(default)]
    pub checksum: String,
}

/// An item placed at a location, as reported by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkItem {
    /// Item id.
    pub item: ItemId,
    /// Location the item was found at.
    pub location: LocationId,
    /// Slot that found (for received items) or owns (for scouts) the item.
    pub player: SlotId,
    /// Progression/useful/trap flags.
    #[serde(default)]
    pub flags: u32,
}

/// A player in the room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPlayer {
    /// Team number.
    #[serde(default)]
    pub team: i32,
    /// Slot number.
    pub slot: SlotId,
    /// Display alias (may equal `name`).
    #[serde(default)]
    pub alias: String,
    /// Slot name.
    pub name: String,
}

impl NetworkPlayer {
    /// Name to show in logs: the alias when set, otherwise the slot name.
    pub fn display_name(&self) -> &str {
        if self.alias.is_empty() { &self.name } else { &self.alias }
    }
}

/// Protocol version triple.
///
/// Serialized with the `class: "Version"` marker the server expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct NetworkVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Build number.
    pub build: u32,
}

impl NetworkVersion {
    /// Create a version triple.
    pub const fn new(major: u32, minor: u32, build: u32) -> Self {
        Self { major, minor, build }
    }
}

impl Serialize for NetworkVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("NetworkVersion", 4)?;
        state.serialize_field("major", &self.major)?;
        state.serialize_field("minor", &self.minor)?;
        state.serialize_field("build", &self.build)?;
        state.serialize_field("class", "Version")?;
        state.end()
    }
}

/// Client game state reported through `StatusUpdate`.
///
/// Serialized as its numeric protocol code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientStatus {
    /// State not known.
    Unknown,
    /// Connected, not yet ready.
    Connected,
    /// Ready to start.
    Ready,
    /// In game.
    Playing,
    /// Goal completed.
    Goal,
}

impl ClientStatus {
    /// Numeric protocol code.
    pub const fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Connected => 5,
            Self::Ready => 10,
            Self::Playing => 20,
            Self::Goal => 30,
        }
    }
}

impl Serialize for ClientStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}
