pub mod base;
pub mod file_store;
pub mod memory_store;
pub mod session_cache;

// Re-export the primary store items so code outside can do
// "use crate::store::{KeyValueStore, SessionCache, create_store};"
pub use base::{CacheError, KeyValueStore, create_store};
pub use session_cache::SessionCache;
