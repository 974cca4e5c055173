use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cache::CacheConfig;
use super::logging::LoggingConfig;
use crate::guard::RedirectConfig;
use crate::identity::IdentityConfig;
use crate::routing::{default_routes, RouteRecord};

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "NAVGUARD_CONFIG";
/// Prefix for environment overrides, e.g. `NAVGUARD_BIND_ADDRESS`.
pub const ENV_PREFIX: &str = "NAVGUARD_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error loading configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid logging.level '{0}'. Valid values: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Route table with access flags. Defaults to home, login and chat.
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteRecord>,
    #[serde(default)]
    pub redirects: RedirectConfig,
}

/// Load config from `./config.yaml` (or the file named by `NAVGUARD_CONFIG`),
/// with `NAVGUARD_`-prefixed environment variables layered on top.
pub fn load_config() -> Result<ConfigV1, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "./config.yaml".to_string());
    let figment = Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));
    extract_config(figment)
}

/// Extract a versioned config from an already assembled figment.
pub fn extract_config(figment: Figment) -> Result<ConfigV1, ConfigError> {
    let config = figment.extract::<Config>().map_err(Box::new)?;
    match config {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheBackend;
    use crate::identity::IdentityConfig;

    const MINIMAL: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:8080
identity:
  type: plain
  name: local
  secret: s3cret
"#;

    fn parse(yaml: &str) -> Result<ConfigV1, ConfigError> {
        extract_config(Figment::new().merge(Yaml::string(yaml)))
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(MINIMAL).expect("minimal config should parse");
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.cache.token_key, "firebaseIdToken");
        assert_eq!(config.cache.profile_key, "firebaseUser");
        assert!(matches!(config.cache.backend, CacheBackend::Memory));
        assert_eq!(config.routes.len(), 3);
        assert_eq!(config.redirects.home, "/");
        assert_eq!(config.redirects.login, "/login");
        assert!(matches!(config.identity, IdentityConfig::Plain(_)));
    }

    #[test]
    fn test_file_cache_and_custom_routes() {
        let yaml = r#"
version: "1.0.0"
bind_address: 0.0.0.0:3000
identity:
  type: plain
  name: local
  secret: s3cret
cache:
  type: file
  path: /tmp/navguard/session.json
  token_key: tok
routes:
  - name: admin
    path: /admin
    meta:
      requiresAuth: true
    children:
      - name: settings
        path: settings
redirects:
  home: /dashboard
  login: /signin
"#;
        let config = parse(yaml).expect("config should parse");
        assert_eq!(config.cache.token_key, "tok");
        assert_eq!(config.cache.profile_key, "firebaseUser");
        match &config.cache.backend {
            CacheBackend::File(file) => {
                assert_eq!(file.path.to_str(), Some("/tmp/navguard/session.json"))
            }
            other => panic!("expected file backend, got {:?}", other),
        }
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].children.len(), 1);
        assert!(config.routes[0].meta.requires_auth);
        assert_eq!(config.redirects.home, "/dashboard");
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let yaml = MINIMAL.replace("1.0.0", "9.9.9");
        assert!(matches!(parse(&yaml), Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_missing_identity_is_rejected() {
        let yaml = r#"
version: "1.0.0"
bind_address: 127.0.0.1:8080
"#;
        assert!(parse(yaml).is_err());
    }
}
