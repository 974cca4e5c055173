//! Auth-state observer registry shared by the identity providers.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

use crate::models::IdentityUser;

/// Called with the provider's current user whenever the auth state changes.
pub type AuthStateCallback = Arc<dyn Fn(Option<&IdentityUser>) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    initialized: bool,
    current: Option<IdentityUser>,
    observers: Vec<(u64, AuthStateCallback)>,
}

/// Holds the live auth state of a provider and fans changes out to observers.
///
/// Once a state has been published, new subscribers are called right away
/// with it, so every subscriber hears at least one state. Callbacks always run
/// outside the registry lock and may unsubscribe from inside the callback.
#[derive(Clone, Default)]
pub struct AuthStateNotifier {
    inner: Arc<Mutex<Registry>>,
}

impl AuthStateNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<IdentityUser> {
        self.lock().current.clone()
    }

    /// True once the provider has reported its first state.
    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    pub fn subscribe(&self, callback: AuthStateCallback) -> Subscription {
        let (id, replay) = {
            let mut registry = self.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.observers.push((id, callback.clone()));
            let replay = registry.initialized.then(|| registry.current.clone());
            (id, replay)
        };

        if let Some(state) = replay {
            callback(state.as_ref());
        }

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Replace the current state and notify every observer.
    pub fn publish(&self, user: Option<IdentityUser>) {
        let (observers, snapshot) = {
            let mut registry = self.lock();
            registry.current = user;
            registry.initialized = true;
            let observers: Vec<_> = registry.observers.iter().map(|(_, cb)| cb.clone()).collect();
            (observers, registry.current.clone())
        };

        debug!(
            "Auth state changed (signed_in={}), notifying {} observer(s)",
            snapshot.is_some(),
            observers.len()
        );
        for callback in observers {
            callback(snapshot.as_ref());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A live auth-state subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .observers
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
