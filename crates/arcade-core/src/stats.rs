use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::game_registry::GameDescriptor;

/// Key the stats snapshot is stored under.
pub const STATS_KEY: &str = "gameStats";

/// Persisted counters for one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub play_count: u32,
    pub high_score: u64,
}

/// Map from game id to its persisted counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsSnapshot {
    pub games: BTreeMap<String, GameStats>,
}

impl StatsSnapshot {
    pub fn from_descriptors<'a>(games: impl IntoIterator<Item = &'a GameDescriptor>) -> Self {
        let games = games
            .into_iter()
            .map(|g| {
                (
                    g.id().to_string(),
                    GameStats {
                        play_count: g.play_count(),
                        high_score: g.high_score(),
                    },
                )
            })
            .collect();
        Self { games }
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|e| StorageError::Malformed(e.to_string()))
    }

    /// Parse stored stats. The top level must be a JSON object (or `null`,
    /// read as empty). Per game, missing, negative, or non-numeric fields
    /// read as zero; entries that are not objects are skipped.
    pub fn parse(text: &str) -> Result<Self, StorageError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| StorageError::Malformed(e.to_string()))?;

        let entries = match value {
            serde_json::Value::Null => return Ok(Self::default()),
            serde_json::Value::Object(entries) => entries,
            other => {
                return Err(StorageError::Malformed(format!(
                    "expected an object of game stats, found {}",
                    json_type_name(&other)
                )));
            },
        };

        let mut games = BTreeMap::new();
        for (id, entry) in entries {
            let Some(fields) = entry.as_object() else {
                tracing::warn!(game = %id, "Skipping stats entry that is not an object");
                continue;
            };
            let read = |name: &str| fields.get(name).and_then(serde_json::Value::as_u64);
            let play_count = read("playCount")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            let high_score = read("highScore").unwrap_or(0);
            games.insert(
                id,
                GameStats {
                    play_count,
                    high_score,
                },
            );
        }
        Ok(Self { games })
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    Io(String),
    Malformed(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "storage I/O error: {e}"),
            Self::Malformed(e) => write!(f, "malformed stored data: {e}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Flat key-value text storage (the browser's localStorage, a directory of
/// files, or memory).
pub trait StatsStore: Send + Sync {
    /// Read the value under `key`; `Ok(None)` when nothing is stored.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one value.
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.values.insert(key.to_string(), value.to_string());
        store
    }
}

impl StatsStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store that keeps each key in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StatsStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    /// Writes a sibling `.tmp` file and renames it over the target, so a
    /// reader sees either the old snapshot or the new one.
    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let io = |e: std::io::Error| StorageError::Io(e.to_string());
        std::fs::create_dir_all(&self.dir).map_err(io)?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        std::fs::write(&tmp, value).map_err(io)?;
        std::fs::rename(&tmp, &path).map_err(io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_snapshot() {
        let snap = StatsSnapshot::parse(
            r#"{"balloon-pop":{"playCount":3,"highScore":17},"memoryMatch":{"playCount":1,"highScore":1520}}"#,
        )
        .unwrap();
        assert_eq!(
            snap.games["balloon-pop"],
            GameStats {
                play_count: 3,
                high_score: 17
            }
        );
        assert_eq!(snap.games["memoryMatch"].high_score, 1520);
    }

    #[test]
    fn missing_and_bad_fields_default_to_zero() {
        let snap = StatsSnapshot::parse(
            r#"{"a":{"playCount":2},"b":{"highScore":"lots","playCount":-4},"c":5}"#,
        )
        .unwrap();
        assert_eq!(
            snap.games["a"],
            GameStats {
                play_count: 2,
                high_score: 0
            }
        );
        assert_eq!(snap.games["b"], GameStats::default());
        assert!(!snap.games.contains_key("c"));
    }

    #[test]
    fn null_is_empty() {
        assert_eq!(
            StatsSnapshot::parse("null").unwrap(),
            StatsSnapshot::default()
        );
    }

    #[test]
    fn malformed_text_is_an_error() {
        assert!(matches!(
            StatsSnapshot::parse("{not json"),
            Err(StorageError::Malformed(_))
        ));
        assert!(matches!(
            StatsSnapshot::parse("[1,2]"),
            Err(StorageError::Malformed(_))
        ));
    }

    #[test]
    fn snapshot_json_shape() {
        let mut snap = StatsSnapshot::default();
        snap.games.insert(
            "balloon-pop".to_string(),
            GameStats {
                play_count: 1,
                high_score: 4,
            },
        );
        assert_eq!(
            snap.to_json().unwrap(),
            r#"{"balloon-pop":{"playCount":1,"highScore":4}}"#
        );
    }

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load(STATS_KEY).unwrap(), None);
        store.save(STATS_KEY, "{}").unwrap();
        assert_eq!(store.load(STATS_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("arcade-stats-{}", std::process::id()));
        let mut store = FileStore::new(&dir);
        assert_eq!(store.load("missing").unwrap(), None);
        store.save(STATS_KEY, r#"{"a":{"playCount":1,"highScore":2}}"#).unwrap();
        let text = store.load(STATS_KEY).unwrap().unwrap();
        assert_eq!(StatsSnapshot::parse(&text).unwrap().games["a"].high_score, 2);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_replaces_whole_file() {
        let dir = std::env::temp_dir().join(format!("arcade-stats-replace-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let mut store = FileStore::new(&dir);

        store.save(STATS_KEY, r#"{"a":{"playCount":10,"highScore":999}}"#).unwrap();
        store.save(STATS_KEY, "{}").unwrap();
        assert_eq!(store.load(STATS_KEY).unwrap().as_deref(), Some("{}"));

        // A leftover partial write from an interrupted save is never read.
        std::fs::write(dir.join("gameStats.json.tmp"), r#"{"a":{"play"#).unwrap();
        assert_eq!(store.load(STATS_KEY).unwrap().as_deref(), Some("{}"));

        store.save(STATS_KEY, r#"{"b":{"playCount":1,"highScore":0}}"#).unwrap();
        assert!(!dir.join("gameStats.json.tmp").exists());
        let names: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("gameStats.json")]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
