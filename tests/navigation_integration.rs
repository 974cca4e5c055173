mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use common::{body_string, build_app, build_started_app, location, request};
use futures::future::join_all;
use jsonwebtoken::{decode, DecodingKey, Validation};
use mockito::{Matcher, Server};
use navguard::guard::BarrierState;
use navguard::identity::IdentityProvider;
use serde::Deserialize;
use tower::ServiceExt;

const ANONYMOUS_CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:0
identity:
  type: plain
  name: local
  secret: test-secret
"#;

const SIGNED_IN_CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:0
identity:
  type: plain
  name: local
  secret: test-secret
  user:
    uid: u-42
    email: ada@example.com
    display_name: Ada
"#;

const REVOKED_CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:0
identity:
  type: plain
  name: local
  secret: test-secret
  revoked: true
  user:
    uid: u-42
"#;

#[derive(Debug, Deserialize)]
struct MintedClaims {
    sub: String,
    iss: String,
    email: Option<String>,
}

#[tokio::test]
async fn test_anonymous_user_is_sent_to_login() {
    let app = build_started_app(ANONYMOUS_CONFIG).await;

    let response = app
        .router
        .clone()
        .oneshot(request("/", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));

    let response = app
        .router
        .oneshot(request("/login", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "view: login");
}

#[tokio::test]
async fn test_signed_in_user_gets_view_and_cached_session() {
    let app = build_started_app(SIGNED_IN_CONFIG).await;
    assert!(app.state.guard.cache().read().is_none());

    let response = app
        .router
        .clone()
        .oneshot(request("/chat/abc?draft=1", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "view: chat");

    let cached = app
        .state
        .guard
        .cache()
        .read()
        .expect("navigation should cache a session");
    let profile = cached.profile.expect("profile should be cached");
    assert_eq!(profile.uid, "u-42");
    assert_eq!(profile.display_name.as_deref(), Some("Ada"));

    let mut validation = Validation::default();
    validation.validate_aud = false;
    let claims = decode::<MintedClaims>(
        &cached.id_token,
        &DecodingKey::from_secret(b"test-secret"),
        &validation,
    )
    .expect("minted token should decode")
    .claims;
    assert_eq!(claims.sub, "u-42");
    assert_eq!(claims.iss, "navguard");
    assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
}

#[tokio::test]
async fn test_signed_in_user_is_sent_home_from_login() {
    let app = build_started_app(SIGNED_IN_CONFIG).await;

    // First navigation fills the cache.
    let response = app
        .router
        .clone()
        .oneshot(request("/", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .oneshot(request("/login", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));
}

#[tokio::test]
async fn test_revoked_session_is_discarded_and_sent_to_login() {
    let app = build_started_app(REVOKED_CONFIG).await;

    let response = app
        .router
        .clone()
        .oneshot(request("/", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));
    assert!(app.state.guard.cache().read().is_none());

    let metrics = body_string(
        app.router
            .oneshot(request("/metrics", Method::GET))
            .await
            .unwrap(),
    )
    .await;
    assert!(metrics.contains(r#"token_mints_total{result="failure"} 1"#));
}

#[tokio::test]
async fn test_sign_out_clears_session_and_guards_again() {
    let app = build_started_app(SIGNED_IN_CONFIG).await;

    let response = app
        .router
        .clone()
        .oneshot(request("/", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.state.guard.cache().is_present());

    let response = app
        .router
        .clone()
        .oneshot(request("/session/sign-out", Method::POST))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));
    assert!(!app.state.guard.cache().is_present());
    assert!(app.identity.current_user().is_none());

    let response = app
        .router
        .oneshot(request("/", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_navigation_waits_for_identity_provider() {
    let app = build_app(SIGNED_IN_CONFIG);
    assert_eq!(app.state.guard.barrier_state(), BarrierState::Uninitialized);

    let router = app.router.clone();
    let pending = tokio::spawn(async move { router.oneshot(request("/", Method::GET)).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!pending.is_finished());
    assert_eq!(app.state.guard.barrier_state(), BarrierState::Waiting);

    app.identity.start().await.unwrap();

    let response = tokio::time::timeout(Duration::from_secs(2), pending)
        .await
        .expect("navigation should resume once the provider reports")
        .unwrap()
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.state.guard.barrier_state(), BarrierState::Ready);
}

#[tokio::test]
async fn test_concurrent_first_navigations_share_one_session() {
    let app = build_started_app(SIGNED_IN_CONFIG).await;

    let responses = join_all(
        (0..8).map(|_| app.router.clone().oneshot(request("/", Method::GET))),
    )
    .await;
    for response in responses {
        assert_eq!(response.unwrap().status(), StatusCode::OK);
    }

    let metrics = app.state.metrics.render();
    assert!(metrics.contains(r#"token_mints_total{result="success"} 1"#));
    assert!(metrics.contains(r#"navigations_total{outcome="allow"} 8"#));
}

#[tokio::test]
async fn test_file_cache_survives_app_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let yaml = format!(
        r#"
version: "1.0.0"
bind_address: 127.0.0.1:0
identity:
  type: plain
  name: local
  secret: test-secret
  user:
    uid: u-42
cache:
  type: file
  path: {}
"#,
        path.display()
    );

    let first = build_started_app(&yaml).await;
    let response = first
        .router
        .oneshot(request("/", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = first.state.guard.cache().read().unwrap().id_token;

    let second = build_started_app(&yaml).await;
    let cached = second
        .state
        .guard
        .cache()
        .read()
        .expect("file cache should be reloaded");
    assert_eq!(cached.id_token, token);

    let response = second
        .router
        .oneshot(request("/login", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));
}

#[tokio::test]
async fn test_firebase_provider_mints_through_securetoken() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("POST", "/v1/token")
        .match_query(Matcher::UrlEncoded("key".into(), "web-key".into()))
        .match_body(Matcher::UrlEncoded(
            "refresh_token".into(),
            "refresh-1".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id_token":"firebase-token","refresh_token":"refresh-2","user_id":"fb-1"}"#)
        .expect(1)
        .create_async()
        .await;

    let yaml = format!(
        r#"
version: "1.0.0"
bind_address: 127.0.0.1:0
identity:
  type: firebase
  name: chat-app
  api_key: web-key
  auth_domain: chat-app.firebaseapp.com
  project_id: chat-app
  securetoken_url: {}
  user:
    uid: fb-1
    email: fb@example.com
    refresh_token: refresh-1
"#,
        server.url()
    );
    let app = build_started_app(&yaml).await;

    let response = app
        .router
        .clone()
        .oneshot(request("/chat/7", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The cached token is reused; no second mint.
    let response = app
        .router
        .oneshot(request("/", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    m.assert_async().await;
    let cached = app.state.guard.cache().read().unwrap();
    assert_eq!(cached.id_token, "firebase-token");
    assert_eq!(cached.profile.unwrap().email.as_deref(), Some("fb@example.com"));
}

#[tokio::test]
async fn test_health_and_unknown_paths() {
    let app = build_app(ANONYMOUS_CONFIG);

    // Health does not wait for the identity provider.
    let response = app
        .router
        .clone()
        .oneshot(request("/health", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");

    let response = app
        .router
        .oneshot(request("/nowhere", Method::GET))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
