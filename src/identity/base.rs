use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    firebase_provider::{FirebaseIdentityConfig, FirebaseIdentityProvider},
    notifier::{AuthStateCallback, Subscription},
    plain_provider::{PlainIdentityConfig, PlainIdentityProvider},
};
use crate::models::IdentityUser;

/// Errors an identity provider reports when asked for a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The provider refused to issue a token for this user.
    #[error("session revoked: {0}")]
    Revoked(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response from identity provider: {0}")]
    InvalidResponse(String),

    #[error("no signed-in user")]
    NoCurrentUser,

    #[error("identity provider misconfigured: {0}")]
    Configuration(String),
}

/// Configuration options for each identity provider.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
#[serde(tag = "type")]
pub enum IdentityConfig {
    #[serde(rename = "firebase")]
    Firebase(FirebaseIdentityConfig),
    #[serde(rename = "plain")]
    Plain(PlainIdentityConfig),
}

/// The adapter in front of an external identity provider.
///
/// The provider owns the live auth state; callers observe it through
/// `current_user` snapshots and `subscribe` callbacks. `start` reports the
/// first state, after which every subscriber is called at least once.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    fn get_name(&self) -> &str;
    fn get_type(&self) -> &str;
    fn subscribe(&self, callback: AuthStateCallback) -> Subscription;
    fn current_user(&self) -> Option<IdentityUser>;
    async fn start(&self) -> Result<(), IdentityError>;
    /// Request a fresh bearer token for an already signed-in user.
    async fn mint_token(&self, user: &IdentityUser) -> Result<String, IdentityError>;
    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Create an identity provider from a given config.
pub fn create_identity_provider(config: &IdentityConfig) -> Arc<dyn IdentityProvider> {
    match config {
        IdentityConfig::Firebase(cfg) => Arc::new(FirebaseIdentityProvider::new(cfg)),
        IdentityConfig::Plain(cfg) => Arc::new(PlainIdentityProvider::new(cfg)),
    }
}
