#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response};
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use navguard::config::{extract_config, ConfigV1};
use navguard::identity::IdentityProvider;
use navguard::routes::create_router;
use navguard::startup::build_app_state;
use navguard::state::AppState;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub identity: Arc<dyn IdentityProvider>,
}

pub fn parse_config(yaml: &str) -> ConfigV1 {
    extract_config(Figment::new().merge(Yaml::string(yaml))).expect("test config should parse")
}

/// Build the app without starting the identity provider.
pub fn build_app(yaml: &str) -> TestApp {
    let config = Arc::new(parse_config(yaml));
    let (state, identity) = build_app_state(config);
    TestApp {
        router: create_router(state.clone()),
        state,
        identity,
    }
}

/// Build the app and let the identity provider report its first state.
pub async fn build_started_app(yaml: &str) -> TestApp {
    let app = build_app(yaml);
    app.identity
        .start()
        .await
        .expect("identity provider should start");
    app
}

pub fn request(path: &str, method: Method) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
}
