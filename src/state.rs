//! Shared application state.

use crate::config::ConfigV1;
use crate::guard::NavigationGuard;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// The navigation guard every view request is routed through.
    pub guard: Arc<NavigationGuard>,
    pub metrics: Metrics,
}
