use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::notifier::{AuthStateCallback, AuthStateNotifier, Subscription};
use super::{IdentityError, IdentityProvider};
use crate::models::IdentityUser;

/// PlainIdentityConfig defines a locally managed identity.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct PlainIdentityConfig {
    /// A friendly name for logs.
    pub name: String,
    /// HMAC secret used to sign minted tokens.
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Lifetime written into the `exp` claim of minted tokens.
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: i64,
    /// The user signed in at startup, if any.
    #[serde(default)]
    pub user: Option<IdentityUser>,
    /// When set, every mint request fails as if the session were revoked.
    #[serde(default)]
    pub revoked: bool,
}

fn default_issuer() -> String {
    "navguard".to_string()
}

fn default_token_lifetime() -> i64 {
    3600
}

/// An identity provider backed by configuration instead of a remote service.
/// Tokens are HS256 JWTs signed with the configured secret.
pub struct PlainIdentityProvider {
    config: PlainIdentityConfig,
    notifier: AuthStateNotifier,
    revoked: AtomicBool,
}

impl PlainIdentityProvider {
    pub fn new(config: &PlainIdentityConfig) -> Self {
        info!("Creating PlainIdentityProvider '{}'", config.name);
        Self {
            config: config.clone(),
            notifier: AuthStateNotifier::new(),
            revoked: AtomicBool::new(config.revoked),
        }
    }

    /// Sign `user` in and notify subscribers.
    pub fn sign_in(&self, user: IdentityUser) {
        info!("Plain provider '{}' signed in '{}'", self.config.name, user.uid);
        self.notifier.publish(Some(user));
    }

    pub fn observer_count(&self) -> usize {
        self.notifier.observer_count()
    }

    pub fn set_revoked(&self, revoked: bool) {
        self.revoked.store(revoked, Ordering::SeqCst);
    }

    fn encode_token(&self, user: &IdentityUser) -> Result<String, IdentityError> {
        #[derive(Serialize)]
        struct Claims<'a> {
            iss: &'a str,
            sub: &'a str,
            iat: i64,
            exp: i64,
            jti: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            email: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            name: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            picture: Option<&'a str>,
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.config.issuer,
            sub: &user.uid,
            iat: now,
            exp: now + self.config.token_lifetime_secs,
            jti: uuid::Uuid::new_v4().to_string(),
            email: user.email.as_deref(),
            name: user.display_name.as_deref(),
            picture: user.photo_url.as_deref(),
        };

        let key = EncodingKey::from_secret(self.config.secret.as_ref());
        encode(&Header::default(), &claims, &key)
            .map_err(|e| IdentityError::Configuration(format!("failed to sign token: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for PlainIdentityProvider {
    fn get_name(&self) -> &str {
        &self.config.name
    }

    fn get_type(&self) -> &str {
        "plain"
    }

    fn subscribe(&self, callback: AuthStateCallback) -> Subscription {
        self.notifier.subscribe(callback)
    }

    fn current_user(&self) -> Option<IdentityUser> {
        self.notifier.current_user()
    }

    /// Report the configured startup user, unless a state was already published.
    async fn start(&self) -> Result<(), IdentityError> {
        if self.notifier.is_initialized() {
            debug!("Plain provider '{}' already reported state", self.config.name);
            return Ok(());
        }
        self.notifier.publish(self.config.user.clone());
        Ok(())
    }

    async fn mint_token(&self, user: &IdentityUser) -> Result<String, IdentityError> {
        if self.revoked.load(Ordering::SeqCst) {
            warn!("Refusing to mint token for '{}': session revoked", user.uid);
            return Err(IdentityError::Revoked(format!(
                "session for '{}' has been revoked",
                user.uid
            )));
        }

        match self.notifier.current_user() {
            Some(current) if current.uid == user.uid => self.encode_token(user),
            _ => Err(IdentityError::NoCurrentUser),
        }
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        info!("Plain provider '{}' signed out", self.config.name);
        self.notifier.publish(None);
        Ok(())
    }
}
