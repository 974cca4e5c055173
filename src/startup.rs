//! Application startup and server initialization.
//!
//! Wires the identity provider, session cache and route table into a
//! [`NavigationGuard`] and serves the router on the configured address.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ConfigV1;
use crate::guard::NavigationGuard;
use crate::identity::{create_identity_provider, IdentityProvider};
use crate::metrics::Metrics;
use crate::routes;
use crate::routing::RouteTable;
use crate::state::AppState;
use crate::store::{create_store, SessionCache};

/// Build the shared state for a config. The identity provider is returned
/// separately so the caller decides when to start it.
pub fn build_app_state(config: Arc<ConfigV1>) -> (AppState, Arc<dyn IdentityProvider>) {
    let identity = create_identity_provider(&config.identity);
    let store = create_store(&config.cache);
    let cache = SessionCache::from_config(store, &config.cache);
    let metrics = Metrics::new();

    let guard = Arc::new(NavigationGuard::new(
        identity.clone(),
        cache,
        RouteTable::new(config.routes.clone()),
        config.redirects.clone(),
        metrics.clone(),
    ));

    let state = AppState {
        config,
        guard,
        metrics,
    };
    (state, identity)
}

/// Initializes and runs the application server.
///
/// The identity provider is started in the background; navigations that
/// arrive before it reports its first auth state wait on the guard's barrier.
///
/// # Errors
///
/// Returns an error if the server fails to bind to the specified address
/// or encounters a runtime error during execution.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let (state, identity) = build_app_state(config.clone());

    info!(
        "Starting {} identity provider '{}'",
        identity.get_type(),
        identity.get_name()
    );
    tokio::spawn(async move {
        if let Err(e) = identity.start().await {
            error!("Identity provider failed to start: {}", e);
        }
    });

    let app = routes::create_router(state);

    info!("Starting server on {}", config.bind_address);
    let listener = TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
