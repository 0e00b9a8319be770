//! Session persistence.
//!
//! A `Store` is a small key-value capability. `FileStore` keeps one JSON
//! file per key with file locking and atomic replacement; `MemoryStore` is
//! the in-memory fake. `SessionStore` serializes the session into a single
//! fixed slot and treats anything it cannot decode as "no saved session".

use crate::types::SessionState;
use crate::{Error, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Storage key of the saved session slot
pub const SESSION_KEY: &str = "workout_session_state_v1";

/// Key-value storage capability
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail, for exercising best-effort saves
    pub fn failing() -> Self {
        Self {
            entries: HashMap::new(),
            fail_writes: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Other(format!("write to '{}' rejected", key)));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed store, one `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Store for FileStore {
    /// Read a key with a shared lock
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            return Err(Error::Io(e));
        }

        file.unlock()?;
        Ok(Some(contents))
    }

    /// Write a key atomically:
    /// 1. Write to a temp file in the same directory
    /// 2. Sync to disk
    /// 3. Rename over the original
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        let temp = NamedTempFile::new_in(&self.dir)?;

        // Exclusive lock on the temp file serializes concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// The single persisted session slot
#[derive(Debug)]
pub struct SessionStore<S: Store> {
    store: S,
}

impl<S: Store> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Serialize the session into the slot
    pub fn save(&mut self, state: &SessionState) -> Result<()> {
        let contents = serde_json::to_string(state)?;
        self.store.set(SESSION_KEY, &contents)?;
        tracing::debug!(
            "Saved session {} at item {} ({:?}, {}s)",
            state.id,
            state.current_index,
            state.phase,
            state.remaining_seconds
        );
        Ok(())
    }

    /// Load the slot, reporting why a stored value was rejected
    pub fn try_load(&self) -> Result<Option<SessionState>> {
        let contents = match self.store.get(SESSION_KEY)? {
            Some(contents) => contents,
            None => return Ok(None),
        };

        let state: SessionState = serde_json::from_str(&contents)
            .map_err(|e| Error::CorruptedSession(format!("undecodable session: {}", e)))?;

        if state.sequence.is_empty() {
            return Err(Error::CorruptedSession("empty sequence".into()));
        }
        if state.current_index >= state.sequence.len() {
            return Err(Error::CorruptedSession(format!(
                "index {} outside sequence of {}",
                state.current_index,
                state.sequence.len()
            )));
        }

        Ok(Some(state))
    }

    /// Load the slot; anything unreadable counts as no saved session
    pub fn load(&self) -> Option<SessionState> {
        match self.try_load() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Discarding saved session: {}", e);
                None
            }
        }
    }

    pub fn has_saved_session(&self) -> bool {
        self.load().is_some()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(SESSION_KEY)?;
        tracing::debug!("Cleared saved session");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternSettings;
    use crate::types::*;

    fn state() -> SessionState {
        let sequence = (0..3)
            .map(|i| {
                SequenceItem::exercise(
                    Exercise::new(
                        format!("Exercise {}", i),
                        BODYWEIGHT,
                        &[FitnessLevel::Beginner],
                        "Legs",
                        SectionType::Main,
                    ),
                    SectionType::Main,
                )
            })
            .collect();
        SessionState::new(
            sequence,
            Timing::default(),
            PatternSettings::default(),
            30,
        )
    }

    #[test]
    fn test_roundtrip_memory() {
        let mut store = SessionStore::new(MemoryStore::new());
        let mut original = state();
        original.current_index = 2;
        original.phase = Phase::Rest;
        original.remaining_seconds = 7;
        original.paused = true;

        store.save(&original).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.sequence.len(), original.sequence.len());
        assert_eq!(loaded.current_index, 2);
        assert_eq!(loaded.phase, Phase::Rest);
        assert_eq!(loaded.remaining_seconds, 7);
        assert!(loaded.paused);
        assert_eq!(loaded.id, original.id);
        assert!(store.has_saved_session());
    }

    #[test]
    fn test_roundtrip_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::new(FileStore::new(temp_dir.path()));
        let original = state();

        store.save(&original).unwrap();
        assert!(temp_dir
            .path()
            .join(format!("{}.json", SESSION_KEY))
            .exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.sequence, original.sequence);
        assert_eq!(loaded.remaining_seconds, original.remaining_seconds);

        store.clear().unwrap();
        assert!(!store.has_saved_session());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupted_slot_is_no_session() {
        let mut store = SessionStore::new(MemoryStore::new());
        store.inner_mut().set(SESSION_KEY, "{ invalid json }").unwrap();

        assert!(matches!(
            store.try_load(),
            Err(Error::CorruptedSession(_))
        ));
        assert!(store.load().is_none());
        assert!(!store.has_saved_session());
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let mut store = SessionStore::new(MemoryStore::new());
        let mut empty = state();
        empty.sequence.clear();
        empty.current_index = 0;
        store.save(&empty).unwrap();

        assert!(matches!(
            store.try_load(),
            Err(Error::CorruptedSession(_))
        ));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_index_out_of_range_rejected() {
        let mut store = SessionStore::new(MemoryStore::new());
        let mut bad = state();
        bad.current_index = 10;
        store.save(&bad).unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        store.set("slot", "{}").unwrap();
        store.set("slot", "{\"a\":1}").unwrap();

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("slot.json")]);
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_missing_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("not-created"));
        assert_eq!(store.get("anything").unwrap(), None);
    }
}
