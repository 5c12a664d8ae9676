//! Durable key-value storage for score and streak.
//!
//! Values are stored as text under two fixed keys. `ScoreRecord` is the typed view
//! the session works with; the `ScoreStore` implementations only move strings.

use std::{
  collections::{BTreeMap, HashMap},
  path::{Path, PathBuf},
};

use tracing::warn;

use crate::error::StoreError;

pub const SCORE_KEY: &str = "cq_score";
pub const STREAK_KEY: &str = "cq_streak";

pub trait ScoreStore: Send {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
  /// Removes every key this store holds.
  fn clear(&mut self) -> Result<(), StoreError>;

  /// Write several keys together. Stores that can do it in one write should override.
  fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
    for (k, v) in entries {
      self.set(k, v)?;
    }
    Ok(())
  }
}

/// Score and streak as the session sees them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreRecord {
  pub score: u64,
  pub streak: u64,
}

impl ScoreRecord {
  /// Absent or unreadable values count as 0.
  pub fn load(store: &dyn ScoreStore) -> Result<Self, StoreError> {
    Ok(Self {
      score: read_counter(store, SCORE_KEY)?,
      streak: read_counter(store, STREAK_KEY)?,
    })
  }

  pub fn save(&self, store: &mut dyn ScoreStore) -> Result<(), StoreError> {
    let score = self.score.to_string();
    let streak = self.streak.to_string();
    store.set_many(&[(SCORE_KEY, &score), (STREAK_KEY, &streak)])
  }
}

fn read_counter(store: &dyn ScoreStore, key: &str) -> Result<u64, StoreError> {
  let Some(raw) = store.get(key)? else { return Ok(0) };
  Ok(raw.trim().parse().unwrap_or_else(|_| {
    warn!(target: "caption_quest", %key, value = %raw, "Stored counter is not a number; using 0");
    0
  }))
}

/// Process-local store. Used per WebSocket connection and in tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
  values: HashMap<String, String>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ScoreStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.values.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
    self.values.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn clear(&mut self) -> Result<(), StoreError> {
    self.values.clear();
    Ok(())
  }
}

/// JSON object on disk, rewritten whole on every write.
///
/// A crash mid-write can lose the file; there is no recovery beyond starting from 0.
#[derive(Debug)]
pub struct FileStore {
  path: PathBuf,
  values: BTreeMap<String, String>,
}

impl FileStore {
  /// Open `path`, starting empty if it does not exist yet.
  pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let path = path.as_ref().to_path_buf();
    let values = match std::fs::read_to_string(&path) {
      Ok(s) if s.trim().is_empty() => BTreeMap::new(),
      Ok(s) => serde_json::from_str(&s)?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
      Err(e) => return Err(e.into()),
    };
    Ok(Self { path, values })
  }

  /// Like [`FileStore::open`], but an unreadable or corrupt file is logged and the
  /// store starts empty. The next save overwrites the file.
  pub fn open_or_empty(path: impl AsRef<Path>) -> Self {
    let path = path.as_ref();
    Self::open(path).unwrap_or_else(|e| {
      warn!(target: "caption_quest", path = %path.display(), error = %e, "Could not read score file; starting from 0");
      Self { path: path.to_path_buf(), values: BTreeMap::new() }
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn flush(&self) -> Result<(), StoreError> {
    if self.values.is_empty() {
      return match std::fs::remove_file(&self.path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
      };
    }
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&self.path, serde_json::to_string_pretty(&self.values)?)?;
    Ok(())
  }
}

impl ScoreStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.values.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
    self.values.insert(key.to_string(), value.to_string());
    self.flush()
  }

  fn clear(&mut self) -> Result<(), StoreError> {
    self.values.clear();
    self.flush()
  }

  fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
    for (k, v) in entries {
      self.values.insert(k.to_string(), v.to_string());
    }
    self.flush()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!("caption-quest-{}.json", uuid::Uuid::new_v4()))
  }

  #[test]
  fn missing_keys_load_as_zero() {
    let store = MemoryStore::new();
    assert_eq!(ScoreRecord::load(&store).unwrap(), ScoreRecord::default());
  }

  #[test]
  fn garbage_values_load_as_zero() {
    let mut store = MemoryStore::new();
    store.set(SCORE_KEY, "lots").unwrap();
    store.set(STREAK_KEY, "3").unwrap();
    assert_eq!(ScoreRecord::load(&store).unwrap(), ScoreRecord { score: 0, streak: 3 });
  }

  #[test]
  fn values_are_written_as_text() {
    let mut store = MemoryStore::new();
    ScoreRecord { score: 36, streak: 3 }.save(&mut store).unwrap();
    assert_eq!(store.get(SCORE_KEY).unwrap().as_deref(), Some("36"));
    assert_eq!(store.get(STREAK_KEY).unwrap().as_deref(), Some("3"));
  }

  #[test]
  fn file_store_survives_reopen_and_clear_removes_file() {
    let path = temp_path();
    {
      let mut store = FileStore::open(&path).unwrap();
      ScoreRecord { score: 22, streak: 2 }.save(&mut store).unwrap();
    }
    let mut reopened = FileStore::open(&path).unwrap();
    assert_eq!(ScoreRecord::load(&reopened).unwrap(), ScoreRecord { score: 22, streak: 2 });

    reopened.clear().unwrap();
    assert!(!path.exists());
    assert_eq!(ScoreRecord::load(&reopened).unwrap(), ScoreRecord::default());
    // clearing twice is fine
    reopened.clear().unwrap();
  }

  #[test]
  fn file_store_rejects_corrupt_file() {
    let path = temp_path();
    std::fs::write(&path, "{not json").unwrap();
    assert!(matches!(FileStore::open(&path), Err(StoreError::Json(_))));
    std::fs::remove_file(&path).unwrap();
  }

  #[test]
  fn corrupt_file_opens_empty_and_is_overwritten_on_save() {
    let path = temp_path();
    std::fs::write(&path, "{not json").unwrap();

    let mut store = FileStore::open_or_empty(&path);
    assert_eq!(ScoreRecord::load(&store).unwrap(), ScoreRecord::default());

    ScoreRecord { score: 10, streak: 1 }.save(&mut store).unwrap();
    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(ScoreRecord::load(&reopened).unwrap(), ScoreRecord { score: 10, streak: 1 });
    std::fs::remove_file(&path).unwrap();
  }
}
