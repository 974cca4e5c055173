use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::file_store::FileStoreConfig;

/// Where the session cache lives and which keys it uses.
/// The default key names are the ones the browser client used.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct CacheConfig {
    #[serde(default = "default_token_key")]
    pub token_key: String,
    #[serde(default = "default_profile_key")]
    pub profile_key: String,
    #[serde(flatten)]
    pub backend: CacheBackend,
}

/// The existing cache backends. We differentiate them via a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum CacheBackend {
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "file")]
    File(FileStoreConfig),
}

fn default_token_key() -> String {
    "firebaseIdToken".to_string()
}

fn default_profile_key() -> String {
    "firebaseUser".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            token_key: default_token_key(),
            profile_key: default_profile_key(),
            backend: CacheBackend::Memory,
        }
    }
}
