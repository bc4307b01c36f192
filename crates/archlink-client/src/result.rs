//! Connect outcome.

use archlink_core::{HandshakeError, InstanceId};
use archlink_proto::{ConnectedPacket, LocationId, NetworkPlayer, SlotId};

/// What the server told us when it accepted the join request.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectedInfo {
    /// Assigned slot.
    pub slot: SlotId,
    /// Team of the assigned slot.
    pub team: i32,
    /// Players in the room.
    pub players: Vec<NetworkPlayer>,
    /// Locations of this slot already checked.
    pub checked_locations: Vec<LocationId>,
    /// Locations of this slot still unchecked.
    pub missing_locations: Vec<LocationId>,
    /// Game-specific slot data.
    pub slot_data: serde_json::Value,
    /// Instance id the session connected with. Persist it to reconnect as
    /// the same client.
    pub instance_id: InstanceId,
}

impl ConnectedInfo {
    pub(crate) fn new(packet: ConnectedPacket, instance_id: InstanceId) -> Self {
        Self {
            slot: packet.slot,
            team: packet.team,
            players: packet.players,
            checked_locations: packet.checked_locations,
            missing_locations: packet.missing_locations,
            slot_data: packet.slot_data,
            instance_id,
        }
    }
}

/// Result of a connect attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionResult {
    /// Server accepted the join request.
    Connected(ConnectedInfo),
    /// Handshake failed.
    Failed(HandshakeError),
}

impl ConnectionResult {
    /// True if the server accepted us.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// Connection details on success.
    pub fn info(&self) -> Option<&ConnectedInfo> {
        match self {
            Self::Connected(info) => Some(info),
            Self::Failed(_) => None,
        }
    }

    /// Failure cause.
    pub fn error(&self) -> Option<&HandshakeError> {
        match self {
            Self::Connected(_) => None,
            Self::Failed(err) => Some(err),
        }
    }

    /// Human-readable failure reason.
    pub fn reason(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }
}
