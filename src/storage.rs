//! Persistence of the diagram collection.
//!
//! The whole [`Roadmap`] is written as one JSON value under a single key of a
//! [`KeyValueStore`]. Loading never fails: a missing, unreadable or corrupt
//! value is logged and replaced by an empty collection.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};

use crate::model::Roadmap;

/// Storage key used when the configuration does not name another one.
pub const DEFAULT_STORAGE_KEY: &str = "roadmap-diagrams";

/// String key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed store: each key lives in `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: Utf8PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> Result<Utf8PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            bail!("Invalid storage key `{}`", key);
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).with_context(|| format!("Read {}", path))?;
        Ok(Some(text))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.root).with_context(|| format!("Create {}", self.root))?;
        // Write next to the target and rename so a crash never leaves half a file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).with_context(|| format!("Write {}", tmp))?;
        std::fs::rename(&tmp, &path).with_context(|| format!("Replace {}", path))?;
        Ok(())
    }
}

/// Read the collection stored under `key`. `Ok(None)` if nothing is stored yet.
pub fn try_load_roadmap(store: &dyn KeyValueStore, key: &str) -> Result<Option<Roadmap>> {
    match store.get(key)? {
        Some(text) => {
            let roadmap = Roadmap::from_json(&text)
                .with_context(|| format!("Parse stored roadmap `{}`", key))?;
            Ok(Some(roadmap))
        }
        None => Ok(None),
    }
}

/// Read the collection stored under `key`, falling back to an empty one.
pub fn load_roadmap(store: &dyn KeyValueStore, key: &str) -> Roadmap {
    match try_load_roadmap(store, key) {
        Ok(Some(roadmap)) => {
            log::debug!("loaded {} diagram(s) from `{}`", roadmap.diagrams.len(), key);
            roadmap
        }
        Ok(None) => {
            log::info!("no stored roadmap under `{}`, starting empty", key);
            Roadmap::default()
        }
        Err(err) => {
            log::warn!("failed to load roadmap `{}`, starting empty: {:#}", key, err);
            Roadmap::default()
        }
    }
}

/// Serialize and store the whole collection under `key`.
pub fn save_roadmap(store: &mut dyn KeyValueStore, key: &str, roadmap: &Roadmap) -> Result<()> {
    let text = roadmap.to_json()?;
    store
        .set(key, &text)
        .with_context(|| format!("Store roadmap `{}`", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::operations::add_diagram;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        let mut roadmap = Roadmap::default();
        add_diagram(&mut roadmap, "Plan");
        save_roadmap(&mut store, DEFAULT_STORAGE_KEY, &roadmap).unwrap();
        assert_eq!(load_roadmap(&store, DEFAULT_STORAGE_KEY), roadmap);
    }

    #[test]
    fn test_missing_key_loads_empty() {
        let store = MemoryStore::new();
        assert!(try_load_roadmap(&store, "absent").unwrap().is_none());
        assert!(load_roadmap(&store, "absent").is_empty());
    }

    #[test]
    fn test_corrupt_value_falls_back() {
        let mut store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        assert!(try_load_roadmap(&store, "k").is_err());
        assert!(load_roadmap(&store, "k").is_empty());
    }

    #[test]
    fn test_file_store_key_validation() {
        let store = FileStore::new("/tmp/roadmap-store");
        assert!(store.path_for("roadmap-diagrams").is_ok());
        assert!(store.path_for("../escape").is_err());
        assert!(store.path_for("a/b").is_err());
        assert!(store.path_for("").is_err());
    }
}
