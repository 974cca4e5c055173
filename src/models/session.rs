use super::user::{IdentityUser, UserProfile};

/// A bearer token together with the profile it was minted for.
///
/// Only ever written to the cache as a whole; there is no partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub profile: UserProfile,
    pub id_token: String,
}

impl SessionRecord {
    /// Build the record for a freshly minted token.
    pub fn from_identity(user: &IdentityUser, id_token: impl Into<String>) -> Self {
        SessionRecord {
            profile: user.profile(),
            id_token: id_token.into(),
        }
    }
}

/// What a cache read yields.
///
/// Presence is decided by the token entry alone. `profile` is `None` when the
/// profile entry is missing or unreadable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSession {
    pub id_token: String,
    pub profile: Option<UserProfile>,
}

impl From<SessionRecord> for CachedSession {
    fn from(record: SessionRecord) -> Self {
        CachedSession {
            id_token: record.id_token,
            profile: Some(record.profile),
        }
    }
}
