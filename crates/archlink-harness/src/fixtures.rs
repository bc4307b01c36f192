//! Test fixtures: a simple id mapping, a controllable checked-locations
//! provider, and packet builders.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use archlink_client::CheckedLocationsProvider;
use archlink_core::IdMapping;
use archlink_proto::{GameData, ItemId, LocationId, NetworkItem, NetworkPlayer, SlotId};
use parking_lot::Mutex;

/// Location ids are `LOCATION_BASE + key`; items are kept as bare ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetMapping;

impl OffsetMapping {
    /// Offset added to location keys.
    pub const LOCATION_BASE: i64 = 1_000;

    /// Server id for `key`.
    pub fn id(key: u32) -> LocationId {
        LocationId(Self::LOCATION_BASE + i64::from(key))
    }
}

impl IdMapping for OffsetMapping {
    type LocationKey = u32;
    type Item = ItemId;

    fn location_id(&self, key: &u32) -> LocationId {
        Self::id(*key)
    }

    fn item(&self, item: &NetworkItem) -> ItemId {
        item.item
    }
}

/// A checked-locations provider whose answer tests can change.
///
/// Starts out unavailable.
#[derive(Clone, Default)]
pub struct CheckedLocations {
    answer: Arc<Mutex<Option<Vec<u32>>>>,
    calls: Arc<AtomicUsize>,
}

impl CheckedLocations {
    /// Provider that cannot answer yet.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Provider answering `keys`.
    pub fn answering(keys: Vec<u32>) -> Self {
        let provider = Self::default();
        provider.set(Some(keys));
        provider
    }

    /// Change the answer.
    pub fn set(&self, answer: Option<Vec<u32>>) {
        *self.answer.lock() = answer;
    }

    /// How many times the session asked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The callback to hand to `Session::connect`.
    pub fn provider(&self) -> CheckedLocationsProvider<u32> {
        let answer = Arc::clone(&self.answer);
        let calls = Arc::clone(&self.calls);
        Arc::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            answer.lock().clone()
        })
    }
}

/// Player entry with an empty alias.
pub fn player(slot: i32, name: &str) -> NetworkPlayer {
    NetworkPlayer { team: 0, slot: SlotId(slot), alias: String::new(), name: name.to_string() }
}

/// Item found at location 0 by slot 0.
pub fn network_item(item: i64) -> NetworkItem {
    NetworkItem { item: ItemId(item), location: LocationId(0), player: SlotId(0), flags: 0 }
}

/// Data package tables for one game.
pub fn game_data(checksum: &str, items: &[(&str, i64)], locations: &[(&str, i64)]) -> GameData {
    GameData {
        item_name_to_id: items
            .iter()
            .map(|(name, id)| ((*name).to_string(), ItemId(*id)))
            .collect::<HashMap<_, _>>(),
        location_name_to_id: locations
            .iter()
            .map(|(name, id)| ((*name).to_string(), LocationId(*id)))
            .collect::<HashMap<_, _>>(),
        checksum: checksum.to_string(),
    }
}
