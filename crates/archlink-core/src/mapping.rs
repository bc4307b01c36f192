//! Game-side id translation.
//!
//! The session never interprets game objects. A game supplies an
//! [`IdMapping`] that turns its own location keys into server location ids
//! and server items into whatever it stores in its received item log.

use archlink_proto::{LocationId, NetworkItem};

/// Translation between game values and server ids.
///
/// Implementations are called from the dispatch thread and from caller
/// threads, so they must be cheap and must not block. A disconnect waits for
/// any call still running on the dispatch thread.
pub trait IdMapping: Send + Sync + 'static {
    /// Game-side identity of a location.
    type LocationKey: Clone + Send + Sync + 'static;

    /// Game-side representation of a received item.
    type Item: Clone + Send + Sync + 'static;

    /// Server id of a game location.
    fn location_id(&self, key: &Self::LocationKey) -> LocationId;

    /// Game item for a server item.
    fn item(&self, item: &NetworkItem) -> Self::Item;
}

/// One location as seen by the game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocationState<K> {
    /// Game-side key.
    pub key: K,
    /// The player has collected this location.
    pub picked_up: bool,
    /// The location is tracked outside the multiworld and never reported.
    pub external: bool,
}

impl<K> LocationState<K> {
    /// Location in its initial state: not collected, not external.
    pub fn new(key: K) -> Self {
        Self { key, picked_up: false, external: false }
    }

    /// True if this location should be reported as checked.
    pub fn is_reportable(&self) -> bool {
        self.picked_up && !self.external
    }
}

/// Identity mapping: location keys are server location ids and items are
/// kept as the server sent them.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawIds;

impl IdMapping for RawIds {
    type LocationKey = LocationId;
    type Item = NetworkItem;

    fn location_id(&self, key: &LocationId) -> LocationId {
        *key
    }

    fn item(&self, item: &NetworkItem) -> NetworkItem {
        *item
    }
}
