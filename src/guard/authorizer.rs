//! The navigation decision: a pure function of route flags, cache presence
//! and whether a live identity exists.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::routing::RouteMeta;

/// Where a refused navigation is sent instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    Home,
    Login,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(RedirectTarget),
}

impl Decision {
    /// Label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Redirect(RedirectTarget::Home) => "redirect_home",
            Decision::Redirect(RedirectTarget::Login) => "redirect_login",
        }
    }
}

/// Paths the redirect targets resolve to.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct RedirectConfig {
    #[serde(default = "default_home")]
    pub home: String,
    #[serde(default = "default_login")]
    pub login: String,
}

fn default_home() -> String {
    "/".to_string()
}

fn default_login() -> String {
    "/login".to_string()
}

impl Default for RedirectConfig {
    fn default() -> Self {
        RedirectConfig {
            home: default_home(),
            login: default_login(),
        }
    }
}

impl RedirectConfig {
    pub fn path(&self, target: RedirectTarget) -> &str {
        match target {
            RedirectTarget::Home => &self.home,
            RedirectTarget::Login => &self.login,
        }
    }
}

/// Decide a navigation once the identity provider's state is known.
///
/// With a cached session, a guest-only route is refused while a live user
/// exists and an auth route is refused while none does. The guest rule is
/// checked first, so a route carrying both flags sends a signed-in user home.
///
/// Without a cached session the live user does not count: the caller has
/// already tried to mint a token for it and failed, so only `requires_auth`
/// matters.
pub fn decide(meta: RouteMeta, cached_present: bool, live_user_present: bool) -> Decision {
    if cached_present {
        if meta.requires_guest && live_user_present {
            return Decision::Redirect(RedirectTarget::Home);
        }
        if meta.requires_auth && !live_user_present {
            return Decision::Redirect(RedirectTarget::Login);
        }
        return Decision::Allow;
    }

    if meta.requires_auth {
        Decision::Redirect(RedirectTarget::Login)
    } else {
        Decision::Allow
    }
}
