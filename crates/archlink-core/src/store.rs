//! Data package cache persistence.
//!
//! Data packages can be large, and the server only resends a game's tables
//! when its checksum changes. Persisting the tables between runs lets most
//! connects exclude every game from the data package request.
//!
//! The trait is synchronous. Implementations share state via `Arc` where
//! needed so one store can be handed to several sessions.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{cache::GameTables, error::CacheError};

/// Load and save cached data package tables.
pub trait CacheStore: Send + Sync + 'static {
    /// Load every persisted game. An empty store yields an empty map.
    fn load(&self) -> Result<HashMap<String, GameTables>, CacheError>;

    /// Persist `games`, replacing the previous contents.
    fn save(&self, games: &HashMap<String, GameTables>) -> Result<(), CacheError>;
}

/// In-memory store. Clones share contents.
#[derive(Clone, Debug, Default)]
pub struct MemoryCacheStore {
    inner: Arc<Mutex<HashMap<String, GameTables>>>,
}

impl MemoryCacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of games stored.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self) -> Result<HashMap<String, GameTables>, CacheError> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, games: &HashMap<String, GameTables>) -> Result<(), CacheError> {
        self.inner.lock().clone_from(games);
        Ok(())
    }
}

/// Store backed by a single JSON file.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-save leaves the previous cache intact.
#[derive(Clone, Debug)]
pub struct JsonFileCacheStore {
    path: PathBuf,
}

impl JsonFileCacheStore {
    /// Store at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default cache file location, `archlink/datapackage.json` under the
    /// platform cache directory.
    pub fn default_path(cache_dir: &Path) -> PathBuf {
        cache_dir.join("archlink").join("datapackage.json")
    }

    /// Path of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for JsonFileCacheStore {
    fn load(&self) -> Result<HashMap<String, GameTables>, CacheError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let text = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&self, games: &HashMap<String, GameTables>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let text = serde_json::to_string(games)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
