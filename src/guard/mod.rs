pub mod authorizer;
pub mod barrier;
pub mod navigation_guard;

// Re-export the guard pieces so callers can do "use crate::guard::*;"
pub use authorizer::{decide, Decision, RedirectConfig, RedirectTarget};
pub use barrier::{BarrierState, InitializationBarrier};
pub use navigation_guard::{Navigation, NavigationGuard};
