//! One-time gate that holds navigation until the identity provider has
//! reported its auth state at least once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::identity::{AuthStateCallback, IdentityProvider, Subscription};
use crate::models::IdentityUser;

/// Lifecycle of the barrier. Moves forward only and never resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierState {
    Uninitialized,
    Waiting,
    Ready,
}

struct BarrierInner {
    state: Mutex<BarrierState>,
    ready_tx: watch::Sender<bool>,
    /// The one-shot observer, held until its first callback.
    subscription: Mutex<Option<Subscription>>,
}

impl BarrierInner {
    fn state(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self) -> MutexGuard<'_, Option<Subscription>> {
        self.subscription.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Transition to READY, wake every waiter and drop the observer.
    /// Later callbacks are ignored.
    fn open(&self) {
        {
            let mut state = self.state();
            if *state == BarrierState::Ready {
                return;
            }
            *state = BarrierState::Ready;
        }
        self.ready_tx.send_replace(true);
        if let Some(subscription) = self.slot().take() {
            subscription.unsubscribe();
        }
        info!("Identity provider reported its first auth state; navigation unblocked");
    }
}

/// The initialization barrier. Cheap to clone; clones share one state.
#[derive(Clone)]
pub struct InitializationBarrier {
    inner: Arc<BarrierInner>,
}

impl InitializationBarrier {
    pub fn new() -> Self {
        let (ready_tx, _) = watch::channel(false);
        InitializationBarrier {
            inner: Arc::new(BarrierInner {
                state: Mutex::new(BarrierState::Uninitialized),
                ready_tx,
                subscription: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> BarrierState {
        *self.inner.state()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == BarrierState::Ready
    }

    /// Returns once `provider` has reported state at least once.
    ///
    /// The first caller subscribes a one-time observer; everyone arriving
    /// before the first callback waits on the same transition. There is no
    /// timeout: a provider that never reports stalls every caller.
    pub async fn await_ready(&self, provider: &dyn IdentityProvider) {
        let mut ready_rx = self.inner.ready_tx.subscribe();

        let first = {
            let mut state = self.inner.state();
            match *state {
                BarrierState::Ready => return,
                BarrierState::Waiting => false,
                BarrierState::Uninitialized => {
                    *state = BarrierState::Waiting;
                    true
                }
            }
        };

        if first {
            self.arm(provider);
        } else {
            debug!("Navigation queued behind the initialization barrier");
        }

        // The sender lives as long as `self`, so this only ends on READY.
        let _ = ready_rx.wait_for(|ready| *ready).await;
    }

    fn arm(&self, provider: &dyn IdentityProvider) {
        debug!(
            "Waiting for first auth state from identity provider '{}'",
            provider.get_name()
        );

        let weak = Arc::downgrade(&self.inner);
        let callback: AuthStateCallback = Arc::new(move |_user: Option<&IdentityUser>| {
            if let Some(inner) = weak.upgrade() {
                inner.open();
            }
        });

        // Providers that already know their state call back from inside
        // `subscribe`, before the handle reaches us.
        let subscription = provider.subscribe(callback);
        let mut slot = self.inner.slot();
        if *self.inner.state() == BarrierState::Ready {
            drop(slot);
            subscription.unsubscribe();
        } else {
            *slot = Some(subscription);
        }
    }
}

impl Default for InitializationBarrier {
    fn default() -> Self {
        Self::new()
    }
}
