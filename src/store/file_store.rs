use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CacheError, KeyValueStore};

/// Config for a file-backed store.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone, PartialEq, Eq)]
pub struct FileStoreConfig {
    /// Location of the JSON file holding the cache entries.
    pub path: PathBuf,
}

/// A durable store kept as a single JSON object on disk.
///
/// The file is read once on construction and mirrored in memory. Every
/// mutation rewrites the whole file through a sibling temporary file and a
/// rename, so concurrent readers see either the old or the new content.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn new(config: &FileStoreConfig) -> Self {
        let entries = load_entries(&config.path);
        debug!(
            "Loaded {} cache entries from '{}'",
            entries.len(),
            config.path.display()
        );
        FileStore {
            path: config.path.clone(),
            entries: Mutex::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), CacheError> {
        let io_err = |source| CacheError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let serialized = serde_json::to_vec_pretty(entries)?;
        let tmp_path = temporary_path(&self.path);
        fs::write(&tmp_path, serialized).map_err(io_err)?;
        fs::rename(&tmp_path, &self.path).map_err(io_err)?;
        Ok(())
    }

    /// Apply `change` to a copy of the entries, persist it, then publish it.
    fn update<F>(&self, change: F) -> Result<(), CacheError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let mut current = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = current.clone();
        change(&mut next);
        self.persist(&next)?;
        *current = next;
        Ok(())
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn load_entries(path: &Path) -> HashMap<String, String> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return HashMap::new(),
        Err(e) => {
            warn!("Could not read cache file '{}': {}", path.display(), e);
            return HashMap::new();
        }
    };

    match serde_json::from_slice(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "Cache file '{}' is not a JSON object of strings, starting empty: {}",
                path.display(),
                e
            );
            HashMap::new()
        }
    }
}

impl KeyValueStore for FileStore {
    fn get_name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_entries(&self, entries: &[(&str, String)]) -> Result<(), CacheError> {
        self.update(|map| {
            for (key, value) in entries {
                map.insert((*key).to_string(), value.clone());
            }
        })
    }

    fn remove_entries(&self, keys: &[&str]) -> Result<(), CacheError> {
        self.update(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
    }
}
