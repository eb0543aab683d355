//! Local persistence for simulated games.
//!
//! The simulated backend keeps every game in one keyed collection that is
//! read and written wholesale on each operation. It is a demo store, not an
//! authoritative one.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use crate::game::{GameError, GameRecord};

/// Whole-collection storage of game records.
pub trait GameStore: Send + Sync {
    /// All stored games. An empty store yields an empty list.
    fn load(&self) -> Result<Vec<GameRecord>, GameError>;

    /// Replaces the stored games with `games`.
    fn save(&self, games: &[GameRecord]) -> Result<(), GameError>;
}

/// Games kept in one pretty-printed JSON file.
///
/// Writes go to a sibling temporary file first and are then renamed over
/// the original, so a crash never leaves a half-written store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GameStore for JsonFileStore {
    fn load(&self) -> Result<Vec<GameRecord>, GameError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(GameError::Store(format!("{}: {e}", self.path.display()))),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text)
            .map_err(|e| GameError::Store(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, games: &[GameRecord]) -> Result<(), GameError> {
        let store_err = |e: std::io::Error| GameError::Store(format!("{}: {e}", self.path.display()));

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(store_err)?;
        }
        let json = serde_json::to_string_pretty(games)
            .map_err(|e| GameError::Store(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(store_err)?;
        fs::rename(&tmp, &self.path).map_err(store_err)?;
        debug!(path = %self.path.display(), count = games.len(), "games saved");
        Ok(())
    }
}

/// Games kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: Mutex<Vec<GameRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryStore {
    fn load(&self) -> Result<Vec<GameRecord>, GameError> {
        Ok(self.games.lock().clone())
    }

    fn save(&self, games: &[GameRecord]) -> Result<(), GameError> {
        *self.games.lock() = games.to_vec();
        Ok(())
    }
}
