//! Client configuration.

use std::time::Duration;

use archlink_proto::NetworkVersion;

/// Time allowed for the server to accept or refuse the join request.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Rooms with more players than this only show rich-text messages that
/// mention us.
pub const DEFAULT_LARGE_SESSION_THRESHOLD: usize = 20;

/// Receive items from other worlds, from our own world, and our starting
/// inventory.
pub const DEFAULT_ITEMS_HANDLING: u8 = 0b111;

/// Game identifier sent in the join request.
pub const DEFAULT_GAME: &str = "Timespinner";

/// Client version sent in the join request.
pub const DEFAULT_CLIENT_VERSION: NetworkVersion = NetworkVersion::new(0, 1, 8);

/// Session configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Game the slot was generated for.
    pub game: String,
    /// Protocol version we claim.
    pub client_version: NetworkVersion,
    /// `items_handling` flags for the join request.
    pub items_handling: u8,
    /// Capability tags for the join request.
    pub tags: Vec<String>,
    /// Ask the server to include slot data in `Connected`.
    pub request_slot_data: bool,
    /// Handshake deadline.
    pub connection_timeout: Duration,
    /// Player count above which broadcasts are filtered.
    pub large_session_threshold: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            game: DEFAULT_GAME.to_string(),
            client_version: DEFAULT_CLIENT_VERSION,
            items_handling: DEFAULT_ITEMS_HANDLING,
            tags: Vec::new(),
            request_slot_data: true,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            large_session_threshold: DEFAULT_LARGE_SESSION_THRESHOLD,
        }
    }
}
