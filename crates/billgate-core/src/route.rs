//! Route trust tiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trust tier shared by a group of routes
///
/// Assigned when routes are registered and never changes per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteGroup {
    /// Public endpoints, no credential
    Common,
    /// Provider callbacks authenticated by a payload signature
    WebHook,
    /// Merchant projects authenticated by an HMAC over the body
    AuthProject,
    /// End users holding a bearer token
    AuthUser,
    /// Internal operator tooling holding the system credential
    SystemUser,
}

impl RouteGroup {
    /// All groups, in registration order
    pub const ALL: [RouteGroup; 5] = [
        RouteGroup::Common,
        RouteGroup::WebHook,
        RouteGroup::AuthProject,
        RouteGroup::AuthUser,
        RouteGroup::SystemUser,
    ];

    /// Path prefix of the group
    pub fn prefix(&self) -> &'static str {
        match self {
            RouteGroup::Common => "/api/v1",
            RouteGroup::WebHook => "/webhook",
            RouteGroup::AuthProject => "/auth/api/v1",
            RouteGroup::AuthUser => "/admin/api/v1",
            RouteGroup::SystemUser => "/system/api/v1",
        }
    }

    /// Whether requests in this group go through policy evaluation
    pub fn requires_authorization(&self) -> bool {
        matches!(self, RouteGroup::AuthUser | RouteGroup::SystemUser)
    }

    /// Stable name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteGroup::Common => "common",
            RouteGroup::WebHook => "web_hook",
            RouteGroup::AuthProject => "auth_project",
            RouteGroup::AuthUser => "auth_user",
            RouteGroup::SystemUser => "system_user",
        }
    }
}

impl fmt::Display for RouteGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
