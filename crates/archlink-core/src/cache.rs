//! Metadata cache.
//!
//! Holds the per-game data package tables (item and location names by id)
//! and the room's player directory. A game's tables are trusted only while
//! their stored checksum matches the checksum the server currently
//! advertises for that game.
//!
//! Ids are global across the multiworld, so the per-game tables are also
//! flattened into two lookup maps. Lookups never fail: a miss returns the
//! stringified id.
//!
//! # Invariants
//!
//! - The flattened lookups are always rebuilt from `games` after any change
//! - After [`DataCache::validate`], every cached game either matches the
//!   advertised checksum or has been evicted

use std::collections::{BTreeSet, HashMap};

use archlink_proto::{ClientPacket, GameData, ItemId, LocationId, NetworkPlayer, SlotId};
use serde::{Deserialize, Serialize};

/// Name tables for one game, keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTables {
    /// Checksum the server advertised for these tables.
    pub checksum: String,
    /// Item id to name.
    pub items: HashMap<ItemId, String>,
    /// Location id to name.
    pub locations: HashMap<LocationId, String>,
}

impl From<&GameData> for GameTables {
    fn from(data: &GameData) -> Self {
        Self {
            checksum: data.checksum.clone(),
            items: data.item_name_to_id.iter().map(|(name, id)| (*id, name.clone())).collect(),
            locations: data
                .location_name_to_id
                .iter()
                .map(|(name, id)| (*id, name.clone()))
                .collect(),
        }
    }
}

/// A data package request produced by cache validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataPackageRequest {
    /// Games whose tables are missing or stale.
    pub stale: Vec<String>,
    /// Games whose cached tables are current and need not be resent.
    pub exclusions: Vec<String>,
}

impl DataPackageRequest {
    /// The outbound packet for this request.
    pub fn into_packet(self) -> ClientPacket {
        ClientPacket::GetDataPackage { games: None, exclusions: Some(self.exclusions) }
    }
}

/// Data package tables and player directory.
#[derive(Clone, Debug, Default)]
pub struct DataCache {
    games: HashMap<String, GameTables>,
    item_names: HashMap<ItemId, String>,
    location_names: HashMap<LocationId, String>,
    players: HashMap<SlotId, String>,
}

impl DataCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache seeded with previously persisted tables.
    pub fn with_games(games: HashMap<String, GameTables>) -> Self {
        let mut cache = Self { games, ..Self::default() };
        cache.rebuild_lookups();
        cache
    }

    /// Cached tables by game name.
    pub fn games(&self) -> &HashMap<String, GameTables> {
        &self.games
    }

    /// Replace cached tables with `games`, keeping the player directory.
    pub fn load_games(&mut self, games: HashMap<String, GameTables>) {
        self.games = games;
        self.rebuild_lookups();
    }

    /// Replace the player directory with `players`.
    pub fn update_players(&mut self, players: &[NetworkPlayer]) {
        self.players = players
            .iter()
            .map(|player| (player.slot, player.display_name().to_string()))
            .collect();
    }

    /// Number of players in the directory.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Compare cached checksums against `server_checksums`.
    ///
    /// Stale tables are evicted. Returns `None` if every advertised game is
    /// already current, otherwise a request naming the current games as
    /// exclusions.
    pub fn validate(
        &mut self,
        server_checksums: &HashMap<String, String>,
    ) -> Option<DataPackageRequest> {
        let mut stale = BTreeSet::new();
        let mut exclusions = BTreeSet::new();

        for (game, checksum) in server_checksums {
            match self.games.get(game) {
                Some(tables) if tables.checksum == *checksum => {
                    exclusions.insert(game.clone());
                },
                Some(_) => {
                    tracing::debug!(%game, "cached data package is stale");
                    self.games.remove(game);
                    stale.insert(game.clone());
                },
                None => {
                    stale.insert(game.clone());
                },
            }
        }

        if stale.is_empty() {
            return None;
        }

        self.rebuild_lookups();
        Some(DataPackageRequest {
            stale: stale.into_iter().collect(),
            exclusions: exclusions.into_iter().collect(),
        })
    }

    /// Merge delivered tables, replacing any cached copy of the same game.
    pub fn merge(&mut self, games: &HashMap<String, GameData>) {
        for (game, data) in games {
            tracing::debug!(
                %game,
                items = data.item_name_to_id.len(),
                locations = data.location_name_to_id.len(),
                "merging data package"
            );
            self.games.insert(game.clone(), GameTables::from(data));
        }
        self.rebuild_lookups();
    }

    /// Display name of `slot`, or the slot number.
    pub fn player_name(&self, slot: SlotId) -> String {
        self.players.get(&slot).cloned().unwrap_or_else(|| slot.to_string())
    }

    /// Name of `item`, or the item id.
    pub fn item_name(&self, item: ItemId) -> String {
        self.item_names.get(&item).cloned().unwrap_or_else(|| item.to_string())
    }

    /// Name of `location`, or the location id.
    pub fn location_name(&self, location: LocationId) -> String {
        self.location_names.get(&location).cloned().unwrap_or_else(|| location.to_string())
    }

    fn rebuild_lookups(&mut self) {
        self.item_names.clear();
        self.location_names.clear();
        for tables in self.games.values() {
            self.item_names.extend(tables.items.iter().map(|(id, name)| (*id, name.clone())));
            self.location_names
                .extend(tables.locations.iter().map(|(id, name)| (*id, name.clone())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_data(checksum: &str, items: &[(&str, i64)], locations: &[(&str, i64)]) -> GameData {
        GameData {
            item_name_to_id: items.iter().map(|(n, id)| (n.to_string(), ItemId(*id))).collect(),
            location_name_to_id: locations
                .iter()
                .map(|(n, id)| (n.to_string(), LocationId(*id)))
                .collect(),
            checksum: checksum.to_string(),
        }
    }

    fn checksums(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(g, c)| (g.to_string(), c.to_string())).collect()
    }

    #[test]
    fn misses_fall_back_to_raw_id() {
        let cache = DataCache::new();
        assert_eq!(cache.player_name(SlotId(7)), "7");
        assert_eq!(cache.item_name(ItemId(-3)), "-3");
        assert_eq!(cache.location_name(LocationId(123456)), "123456");
    }

    #[test]
    fn merged_tables_resolve_names() {
        let mut cache = DataCache::new();
        let games = HashMap::from([(
            "Seaside".to_string(),
            game_data("abc", &[("Lantern", 1)], &[("Old Pier", 100)]),
        )]);
        cache.merge(&games);

        assert_eq!(cache.item_name(ItemId(1)), "Lantern");
        assert_eq!(cache.location_name(LocationId(100)), "Old Pier");
    }

    #[test]
    fn player_directory_prefers_alias() {
        let mut cache = DataCache::new();
        cache.update_players(&[
            NetworkPlayer { team: 0, slot: SlotId(1), alias: "Al".into(), name: "alice".into() },
            NetworkPlayer { team: 0, slot: SlotId(2), alias: String::new(), name: "bob".into() },
        ]);

        assert_eq!(cache.player_name(SlotId(1)), "Al");
        assert_eq!(cache.player_name(SlotId(2)), "bob");
        assert_eq!(cache.player_count(), 2);
    }

    #[test]
    fn update_players_replaces_directory() {
        let mut cache = DataCache::new();
        cache.update_players(&[NetworkPlayer {
            team: 0,
            slot: SlotId(1),
            alias: String::new(),
            name: "alice".into(),
        }]);
        cache.update_players(&[]);

        assert_eq!(cache.player_name(SlotId(1)), "1");
    }

    #[test]
    fn empty_cache_requests_every_game() {
        let mut cache = DataCache::new();
        let request = cache.validate(&checksums(&[("A", "1"), ("B", "2")])).unwrap();

        assert_eq!(request.stale, vec!["A", "B"]);
        assert!(request.exclusions.is_empty());
    }

    #[test]
    fn current_games_become_exclusions() {
        let mut cache = DataCache::new();
        cache.merge(&HashMap::from([
            ("A".to_string(), game_data("1", &[("a", 1)], &[])),
            ("B".to_string(), game_data("old", &[("b", 2)], &[])),
        ]));

        let request = cache.validate(&checksums(&[("A", "1"), ("B", "new")])).unwrap();

        assert_eq!(request.stale, vec!["B"]);
        assert_eq!(request.exclusions, vec!["A"]);
        assert_eq!(cache.item_name(ItemId(2)), "2", "stale tables are evicted");
        assert_eq!(cache.item_name(ItemId(1)), "a");
    }

    #[test]
    fn fully_current_cache_requests_nothing() {
        let mut cache = DataCache::new();
        cache.merge(&HashMap::from([("A".to_string(), game_data("1", &[], &[]))]));

        assert_eq!(cache.validate(&checksums(&[("A", "1")])), None);
    }

    #[test]
    fn request_packet_carries_exclusions() {
        let request = DataPackageRequest { stale: vec!["B".into()], exclusions: vec!["A".into()] };
        assert_eq!(
            request.into_packet(),
            ClientPacket::GetDataPackage { games: None, exclusions: Some(vec!["A".into()]) }
        );
    }

    #[test]
    fn seeded_cache_rebuilds_lookups() {
        let tables = GameTables::from(&game_data("1", &[("Rope", 9)], &[]));
        let cache = DataCache::with_games(HashMap::from([("A".to_string(), tables)]));
        assert_eq!(cache.item_name(ItemId(9)), "Rope");
    }
}
