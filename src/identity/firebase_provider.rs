use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::notifier::{AuthStateCallback, AuthStateNotifier, Subscription};
use super::{IdentityError, IdentityProvider};
use crate::models::IdentityUser;

/// Error codes from the token endpoint that mean the session is gone for good.
const REVOKED_CODES: &[&str] = &[
    "TOKEN_EXPIRED",
    "USER_DISABLED",
    "USER_NOT_FOUND",
    "INVALID_REFRESH_TOKEN",
];

/// Config for a Firebase web app. The first block mirrors the settings a web
/// client is initialised with.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct FirebaseIdentityConfig {
    pub name: String,
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: Option<String>,
    #[serde(default)]
    pub messaging_sender_id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub measurement_id: Option<String>,

    /// Base URL of the secure token service.
    #[serde(default = "default_securetoken_url")]
    pub securetoken_url: String,
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
    /// A previously persisted sign-in, restored at startup.
    #[serde(default)]
    pub user: Option<FirebasePersistedUser>,
}

/// A signed-in user as persisted by the client, with its refresh token.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct FirebasePersistedUser {
    #[serde(flatten)]
    pub identity: IdentityUser,
    pub refresh_token: String,
}

fn default_securetoken_url() -> String {
    "https://securetoken.googleapis.com".to_string()
}

fn default_timeout_in_ms() -> u64 {
    10_000
}

#[derive(Deserialize)]
struct TokenResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// An identity provider that mints ID tokens by exchanging the signed-in
/// user's refresh token at the Firebase secure token service.
pub struct FirebaseIdentityProvider {
    config: FirebaseIdentityConfig,
    client: reqwest::Client,
    notifier: AuthStateNotifier,
    refresh_token: Mutex<Option<String>>,
}

impl FirebaseIdentityProvider {
    pub fn new(config: &FirebaseIdentityConfig) -> Self {
        info!(
            "Creating FirebaseIdentityProvider '{}' for project '{}'",
            config.name, config.project_id
        );
        Self {
            config: config.clone(),
            client: reqwest::Client::new(),
            notifier: AuthStateNotifier::new(),
            refresh_token: Mutex::new(config.user.as_ref().map(|u| u.refresh_token.clone())),
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}/v1/token?key={}",
            self.config.securetoken_url.trim_end_matches('/'),
            self.config.api_key
        )
    }

    fn stored_refresh_token(&self) -> Option<String> {
        self.refresh_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_refresh_token(&self, token: Option<String>) {
        *self.refresh_token.lock().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

/// Map an error body from the token endpoint to an IdentityError.
fn classify_error(status: reqwest::StatusCode, body: &str) -> IdentityError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|r| r.error.message)
        .unwrap_or_else(|_| format!("HTTP {}", status));

    // Messages look like "TOKEN_EXPIRED" or "INVALID_REFRESH_TOKEN : details".
    let code = message.split([' ', ':']).next().unwrap_or_default();
    if REVOKED_CODES.contains(&code) {
        IdentityError::Revoked(message)
    } else {
        IdentityError::InvalidResponse(message)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    fn get_name(&self) -> &str {
        &self.config.name
    }

    fn get_type(&self) -> &str {
        "firebase"
    }

    fn subscribe(&self, callback: AuthStateCallback) -> Subscription {
        self.notifier.subscribe(callback)
    }

    fn current_user(&self) -> Option<IdentityUser> {
        self.notifier.current_user()
    }

    /// Restore the persisted sign-in (or report signed-out) as the first state.
    async fn start(&self) -> Result<(), IdentityError> {
        if self.notifier.is_initialized() {
            return Ok(());
        }
        let user = self.config.user.as_ref().map(|u| u.identity.clone());
        debug!(
            "Firebase provider '{}' restored persisted user: {}",
            self.config.name,
            user.is_some()
        );
        self.notifier.publish(user);
        Ok(())
    }

    async fn mint_token(&self, user: &IdentityUser) -> Result<String, IdentityError> {
        match self.notifier.current_user() {
            Some(current) if current.uid == user.uid => {}
            _ => return Err(IdentityError::NoCurrentUser),
        }
        let refresh_token = self
            .stored_refresh_token()
            .ok_or(IdentityError::NoCurrentUser)?;

        debug!(
            "Requesting ID token for '{}' from '{}'",
            user.uid, self.config.securetoken_url
        );

        let resp = self
            .client
            .post(self.token_url())
            .timeout(Duration::from_millis(self.config.timeout_in_ms))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        if !status.is_success() {
            let err = classify_error(status, &body);
            warn!("Token request for '{}' rejected: {}", user.uid, err);
            return Err(err);
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| IdentityError::InvalidResponse(format!("bad token JSON: {}", e)))?;

        if let Some(returned_uid) = token.user_id.as_deref() {
            if returned_uid != user.uid {
                return Err(IdentityError::InvalidResponse(format!(
                    "token issued for '{}' instead of '{}'",
                    returned_uid, user.uid
                )));
            }
        }

        if let Some(rotated) = token.refresh_token {
            self.store_refresh_token(Some(rotated));
        }
        Ok(token.id_token)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        info!("Firebase provider '{}' signed out", self.config.name);
        self.store_refresh_token(None);
        self.notifier.publish(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn persisted_user() -> FirebasePersistedUser {
        FirebasePersistedUser {
            identity: IdentityUser::new("uid-1").with_email("ada@example.com"),
            refresh_token: "refresh-1".to_string(),
        }
    }

    fn create_test_config(url: String, user: Option<FirebasePersistedUser>) -> FirebaseIdentityConfig {
        FirebaseIdentityConfig {
            name: "TestFirebase".to_string(),
            api_key: "test-key".to_string(),
            auth_domain: "test.firebaseapp.com".to_string(),
            project_id: "test-project".to_string(),
            storage_bucket: None,
            messaging_sender_id: None,
            app_id: None,
            measurement_id: None,
            securetoken_url: url,
            timeout_in_ms: 2_000,
            user,
        }
    }

    async fn started_provider(url: String) -> FirebaseIdentityProvider {
        let provider = FirebaseIdentityProvider::new(&create_test_config(url, Some(persisted_user())));
        provider.start().await.unwrap();
        provider
    }

    #[tokio::test]
    async fn test_mint_token_success_rotates_refresh_token() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/v1/token")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "refresh-1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id_token":"T1","refresh_token":"refresh-2","user_id":"uid-1","expires_in":"3600"}"#)
            .create_async()
            .await;

        let provider = started_provider(server.url()).await;
        let user = provider.current_user().unwrap();
        let token = provider.mint_token(&user).await;

        m.assert_async().await;
        assert_eq!(token, Ok("T1".to_string()));
        assert_eq!(provider.stored_refresh_token().as_deref(), Some("refresh-2"));
    }

    #[tokio::test]
    async fn test_mint_token_expired_is_revoked() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/token")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"TOKEN_EXPIRED","status":"INVALID_ARGUMENT"}}"#)
            .create_async()
            .await;

        let provider = started_provider(server.url()).await;
        let user = provider.current_user().unwrap();
        let result = provider.mint_token(&user).await;
        assert!(matches!(result, Err(IdentityError::Revoked(ref m)) if m == "TOKEN_EXPIRED"));
    }

    #[tokio::test]
    async fn test_mint_token_server_error_is_invalid_response() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/token")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;

        let provider = started_provider(server.url()).await;
        let user = provider.current_user().unwrap();
        let result = provider.mint_token(&user).await;
        assert!(matches!(result, Err(IdentityError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_mint_token_mismatched_uid_is_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/token")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"id_token":"T1","user_id":"someone-else"}"#)
            .create_async()
            .await;

        let provider = started_provider(server.url()).await;
        let user = provider.current_user().unwrap();
        assert!(matches!(
            provider.mint_token(&user).await,
            Err(IdentityError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_mint_token_unreachable_is_network_error() {
        // Nothing listens on port 9 on loopback.
        let provider = started_provider("http://127.0.0.1:9".to_string()).await;
        let user = provider.current_user().unwrap();
        assert!(matches!(
            provider.mint_token(&user).await,
            Err(IdentityError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_start_without_persisted_user_reports_signed_out() {
        let provider =
            FirebaseIdentityProvider::new(&create_test_config("http://unused".to_string(), None));
        provider.start().await.unwrap();
        assert!(provider.current_user().is_none());
        assert_eq!(
            provider.mint_token(&IdentityUser::new("uid-1")).await,
            Err(IdentityError::NoCurrentUser)
        );
    }

    #[tokio::test]
    async fn test_sign_out_forgets_refresh_token() {
        let provider = started_provider("http://unused".to_string()).await;
        provider.sign_out().await.unwrap();
        assert!(provider.current_user().is_none());
        assert!(provider.stored_refresh_token().is_none());
    }

    #[test]
    fn test_classify_error_with_details_suffix() {
        let body = r#"{"error":{"message":"INVALID_REFRESH_TOKEN : bad token"}}"#;
        assert!(matches!(
            classify_error(reqwest::StatusCode::BAD_REQUEST, body),
            IdentityError::Revoked(_)
        ));
    }
}
