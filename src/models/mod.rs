pub mod session;
pub mod user;

pub use session::{CachedSession, SessionRecord};
pub use user::{IdentityUser, UserProfile};
