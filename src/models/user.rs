use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The signed-in identity as reported by an identity provider.
///
/// Owned by the provider; the guard only ever works with snapshots of it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct IdentityUser {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl IdentityUser {
    /// Construct a user carrying only the stable identifier.
    pub fn new(uid: impl Into<String>) -> Self {
        IdentityUser {
            uid: uid.into(),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_photo_url(mut self, photo_url: impl Into<String>) -> Self {
        self.photo_url = Some(photo_url.into());
        self
    }

    /// The display profile persisted next to the bearer token.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
        }
    }
}

/// The serialized profile record kept in the session cache.
///
/// Field names match what the browser client stored, so a cache written by
/// either side stays readable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_uses_client_field_names() {
        let user = IdentityUser::new("u-1")
            .with_email("ada@example.com")
            .with_display_name("Ada");

        let value = serde_json::to_value(user.profile()).unwrap();
        assert_eq!(
            value,
            json!({
                "uid": "u-1",
                "email": "ada@example.com",
                "displayName": "Ada",
                "photoURL": null,
            })
        );
    }

    #[test]
    fn test_profile_parses_missing_optionals_as_absent() {
        let profile: UserProfile = serde_json::from_str(r#"{"uid":"u-2"}"#).unwrap();
        assert_eq!(profile.uid, "u-2");
        assert!(profile.email.is_none());
        assert!(profile.photo_url.is_none());
    }
}
