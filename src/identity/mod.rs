pub mod base;
pub mod firebase_provider;
pub mod notifier;
pub mod plain_provider;

// Re-export from base.rs so we can do "use crate::identity::*;"
pub use base::*;
pub use notifier::{AuthStateCallback, AuthStateNotifier, Subscription};
