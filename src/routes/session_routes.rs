//! Session management endpoints.

use crate::guard::RedirectTarget;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::post,
    Router,
};
use tracing::{error, info};

pub fn routes() -> Router<AppState> {
    Router::new().route("/session/sign-out", post(sign_out))
}

/// Explicit sign-out: drops the cached session, signs out at the identity
/// provider and sends the client to the login view.
async fn sign_out(State(state): State<AppState>) -> Result<impl IntoResponse, HTTPError> {
    state.guard.sign_out().await.map_err(|e| {
        error!("Sign-out failed: {}", e);
        HTTPError::new(StatusCode::BAD_GATEWAY, format!("Sign-out failed: {}", e))
    })?;

    info!("User signed out");
    let login = state.guard.redirects().path(RedirectTarget::Login);
    Ok(Redirect::to(login))
}
