use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::RwLock;

use crate::error::StorageError;

/// Named string slots, the persistence primitive behind the favorites store.
pub trait KeyValueStore: Send + Sync {
    /// Read a slot, `None` when it was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Overwrite a slot.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Stores each slot as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the slot files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        fs::create_dir_all(&self.root)?;
        // Write beside the target and rename so readers never see a torn value.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }
}

/// In-process store, used for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one slot.
    pub fn with_slot(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.slots.write().insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_round_trip() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().join("storage"));
        assert_eq!(store.get("favorite_games_ids")?, None);

        store.set("favorite_games_ids", "[1,2]")?;
        assert_eq!(store.get("favorite_games_ids")?.as_deref(), Some("[1,2]"));
        assert!(store.root().join("favorite_games_ids.json").is_file());

        store.set("favorite_games_ids", "[]")?;
        assert_eq!(store.get("favorite_games_ids")?.as_deref(), Some("[]"));
        Ok(())
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let store = FileStore::new("unused");
        assert!(matches!(
            store.get("../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.set("", "x"), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn memory_store_shared_through_arc() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::with_slot("a", "1"));
        let shared = Arc::clone(&store);
        shared.set("b", "2")?;
        assert_eq!(store.get("a")?.as_deref(), Some("1"));
        assert_eq!(store.get("b")?.as_deref(), Some("2"));
        Ok(())
    }
}
