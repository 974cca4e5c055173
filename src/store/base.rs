use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::{file_store::FileStore, memory_store::MemoryStore};
use crate::config::{CacheBackend, CacheConfig};

/// Errors raised while persisting cache entries.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to serialize cache entry: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to persist cache file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The KeyValueStore trait abstracts the durable string store behind the
/// session cache.
///
/// Reads are synchronous and infallible: a store that cannot produce a value
/// reports the key as absent. Writes and removals are applied as one unit
/// across every key passed in.
pub trait KeyValueStore: Send + Sync {
    fn get_name(&self) -> &str;
    fn get(&self, key: &str) -> Option<String>;
    fn set_entries(&self, entries: &[(&str, String)]) -> Result<(), CacheError>;
    fn remove_entries(&self, keys: &[&str]) -> Result<(), CacheError>;
}

/// Creates a concrete store implementation based on the CacheConfig.
pub fn create_store(config: &CacheConfig) -> Arc<dyn KeyValueStore> {
    match &config.backend {
        CacheBackend::Memory => {
            info!("Session cache uses the in-memory store.");
            Arc::new(MemoryStore::new())
        }
        CacheBackend::File(file_config) => {
            info!(
                "Session cache uses the file store at '{}'.",
                file_config.path.display()
            );
            Arc::new(FileStore::new(file_config))
        }
    }
}
