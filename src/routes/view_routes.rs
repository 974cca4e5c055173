//! View routes guarded by the navigation guard.

use crate::guard::Navigation;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tracing::debug;

/// Mount every path of the route table behind the guard middleware.
pub fn routes(state: &AppState) -> Router<AppState> {
    let paths = state.guard.routes().axum_paths();
    if paths.is_empty() {
        return Router::new();
    }

    paths
        .iter()
        .fold(Router::new(), |router, path| {
            router.route(path, get(render_view))
        })
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            navigation_guard,
        ))
}

/// Each view request is one navigation attempt.
async fn navigation_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    match state.guard.navigate(&path).await {
        Navigation::Proceed => next.run(request).await,
        Navigation::Redirect(target) => {
            debug!("Redirecting navigation '{}' to '{}'", path, target);
            Redirect::to(&target).into_response()
        }
    }
}

/// Placeholder for the rendered view.
async fn render_view(State(state): State<AppState>, uri: Uri) -> impl IntoResponse {
    let name = state
        .guard
        .routes()
        .resolve(uri.path())
        .map(|m| m.name().to_string())
        .unwrap_or_default();
    format!("view: {}", name)
}
