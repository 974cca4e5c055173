use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{CacheError, KeyValueStore};
use crate::config::CacheConfig;
use crate::models::{CachedSession, SessionRecord, UserProfile};
use crate::utils::log_throttle::should_emit;

const CORRUPT_PROFILE_LOG_KEY: &str = "session_cache.corrupt_profile";
const CORRUPT_PROFILE_LOG_WINDOW: Duration = Duration::from_secs(60);

/// The session cache: a bearer token and its profile stored under two keys.
///
/// The token key alone decides whether a session is cached. No expiry is
/// tracked here; staleness is the caller's concern.
#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn KeyValueStore>,
    token_key: String,
    profile_key: String,
}

impl SessionCache {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        token_key: impl Into<String>,
        profile_key: impl Into<String>,
    ) -> Self {
        SessionCache {
            store,
            token_key: token_key.into(),
            profile_key: profile_key.into(),
        }
    }

    /// Build a cache over `store` using the key names from the config.
    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &CacheConfig) -> Self {
        Self::new(store, &config.token_key, &config.profile_key)
    }

    /// Returns the cached session, if any. Never fails.
    ///
    /// An empty token counts as no token. A profile entry that does not parse
    /// is reported as a missing profile; the session itself stays present.
    pub fn read(&self) -> Option<CachedSession> {
        let id_token = self.store.get(&self.token_key).filter(|t| !t.is_empty())?;

        let profile = self.store.get(&self.profile_key).and_then(|raw| {
            match serde_json::from_str::<UserProfile>(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    if let Some(suppressed) =
                        should_emit(CORRUPT_PROFILE_LOG_KEY, CORRUPT_PROFILE_LOG_WINDOW)
                    {
                        warn!(
                            "Ignoring unreadable profile entry '{}' in {} store ({} suppressed): {}",
                            self.profile_key,
                            self.store.get_name(),
                            suppressed,
                            e
                        );
                    }
                    None
                }
            }
        });

        Some(CachedSession { id_token, profile })
    }

    /// Cache presence as the guard sees it: a non-empty token entry.
    pub fn is_present(&self) -> bool {
        self.store
            .get(&self.token_key)
            .is_some_and(|t| !t.is_empty())
    }

    /// Persist token and profile as one unit, replacing any previous entry.
    pub fn write(&self, record: &SessionRecord) -> Result<(), CacheError> {
        let profile = serde_json::to_string(&record.profile)?;
        self.store.set_entries(&[
            (self.token_key.as_str(), record.id_token.clone()),
            (self.profile_key.as_str(), profile),
        ])?;
        debug!(
            "Cached session for uid '{}' in {} store",
            record.profile.uid,
            self.store.get_name()
        );
        Ok(())
    }

    /// Remove any cached session. Clearing an empty cache is a no-op.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.store
            .remove_entries(&[self.token_key.as_str(), self.profile_key.as_str()])?;
        debug!("Cleared session cache in {} store", self.store.get_name());
        Ok(())
    }
}
