//! HTTP route definitions and handlers.
//!
//! View routes come from the configured route table and sit behind the
//! navigation guard. Session, health and metrics routes are unguarded.

mod health_routes;
mod metrics_routes;
mod session_routes;
mod view_routes;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(view_routes::routes(&state))
        .merge(session_routes::routes())
        .merge(health_routes::routes())
        .merge(metrics_routes::routes())
        .with_state(state)
}
