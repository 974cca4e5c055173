use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::authorizer::{decide, Decision, RedirectConfig};
use super::barrier::{BarrierState, InitializationBarrier};
use crate::identity::{IdentityError, IdentityProvider};
use crate::metrics::{Metrics, MetricsRecorder};
use crate::models::{IdentityUser, SessionRecord};
use crate::routing::{RouteMeta, RouteTable};
use crate::store::SessionCache;

/// What the host router should do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(String),
}

/// Runs every navigation through the barrier, the session cache and the
/// authorizer.
pub struct NavigationGuard {
    identity: Arc<dyn IdentityProvider>,
    cache: SessionCache,
    routes: RouteTable,
    redirects: RedirectConfig,
    barrier: InitializationBarrier,
    metrics: Metrics,
    /// Serializes mint-and-write so concurrent navigations do not race on
    /// the cache.
    mint_lock: Mutex<()>,
}

impl NavigationGuard {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        cache: SessionCache,
        routes: RouteTable,
        redirects: RedirectConfig,
        metrics: Metrics,
    ) -> Self {
        NavigationGuard {
            identity,
            cache,
            routes,
            redirects,
            barrier: InitializationBarrier::new(),
            metrics,
            mint_lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn redirects(&self) -> &RedirectConfig {
        &self.redirects
    }

    pub fn barrier_state(&self) -> BarrierState {
        self.barrier.state()
    }

    /// Authorize a navigation to `path` and translate the decision into
    /// something the router can apply.
    pub async fn navigate(&self, path: &str) -> Navigation {
        let meta = self.routes.meta_for(path);
        let decision = self.authorize(meta).await;

        match decision {
            Decision::Allow => {
                debug!("Navigation to '{}' allowed", path);
                Navigation::Proceed
            }
            Decision::Redirect(target) => {
                let to = self.redirects.path(target).to_string();
                info!("Navigation to '{}' redirected to '{}'", path, to);
                Navigation::Redirect(to)
            }
        }
    }

    /// Decide a navigation to a route carrying `meta`.
    pub async fn authorize(&self, meta: RouteMeta) -> Decision {
        if !self.barrier.is_ready() {
            let started = Instant::now();
            self.barrier.await_ready(self.identity.as_ref()).await;
            self.metrics
                .record_barrier_wait(started.elapsed().as_secs_f64());
        }

        let live_user = self.identity.current_user();
        let cached_present = match (self.cache.is_present(), &live_user) {
            (true, _) => true,
            (false, Some(user)) => self.refresh_session(user).await,
            (false, None) => false,
        };

        let decision = decide(meta, cached_present, live_user.is_some());
        self.metrics.record_navigation(decision.label());
        decision
    }

    /// Mint a token for `user` and cache it. Returns whether a session is
    /// cached afterwards.
    async fn refresh_session(&self, user: &IdentityUser) -> bool {
        let _serialized = self.mint_lock.lock().await;

        // Another navigation may have filled the cache while we queued.
        if self.cache.is_present() {
            debug!("Session for '{}' was cached by a concurrent navigation", user.uid);
            return true;
        }

        let token = match self.identity.mint_token(user).await {
            Ok(token) => token,
            Err(e) => {
                error!("Failed to get ID token for '{}': {}", user.uid, e);
                return self.discard_session();
            }
        };

        let record = SessionRecord::from_identity(user, token);
        if let Err(e) = self.cache.write(&record) {
            error!("Failed to cache session for '{}': {}", user.uid, e);
            return self.discard_session();
        }

        self.metrics.record_token_mint("success");
        debug!("Minted and cached a fresh token for '{}'", user.uid);
        true
    }

    fn discard_session(&self) -> bool {
        self.metrics.record_token_mint("failure");
        if let Err(e) = self.cache.clear() {
            warn!("Failed to clear session cache: {}", e);
        }
        false
    }

    /// Explicit sign-out: drop the cached session and sign out at the provider.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        if let Err(e) = self.cache.clear() {
            warn!("Failed to clear session cache on sign-out: {}", e);
        }
        self.identity.sign_out().await
    }
}
