//! Caller identity
//!
//! An [`Identity`] is produced once per request by authentication and is
//! read-only afterwards. Routes that need no credential still carry one,
//! zero-valued.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known role names
pub mod roles {
    /// Internal operator tooling
    pub const SYSTEM: &str = "system";

    /// Merchant project authenticated by request signature
    pub const PROJECT: &str = "project";
}

/// Resolved caller context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User, project or system identifier
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Email address
    #[serde(default)]
    pub email: String,

    /// Role used for policy evaluation
    #[serde(default)]
    pub role: String,

    /// Merchant the caller acts for, if any
    #[serde(default)]
    pub merchant_id: String,

    /// User profile identifier, if any
    #[serde(default)]
    pub profile_id: String,
}

impl Identity {
    /// Zero-valued identity for routes without a credential
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Identity of internal operator tooling
    pub fn system() -> Self {
        Self {
            id: roles::SYSTEM.to_string(),
            name: "system".to_string(),
            role: roles::SYSTEM.to_string(),
            ..Self::default()
        }
    }

    /// Identity of a signed merchant project
    pub fn project(project_id: impl Into<String>, merchant_id: impl Into<String>) -> Self {
        Self {
            id: project_id.into(),
            role: roles::PROJECT.to_string(),
            merchant_id: merchant_id.into(),
            ..Self::default()
        }
    }

    /// Whether no caller was authenticated
    pub fn is_anonymous(&self) -> bool {
        self.id.is_empty()
    }

    /// Set name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Set role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Set merchant
    pub fn with_merchant(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = merchant_id.into();
        self
    }

    /// Set profile
    pub fn with_profile(mut self, profile_id: impl Into<String>) -> Self {
        self.profile_id = profile_id.into();
        self
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            write!(f, "Identity(anonymous)")
        } else {
            write!(f, "Identity(id={}, role={})", self.id, self.role)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_identity_is_zero_valued() {
        let identity = Identity::anonymous();
        assert!(identity.is_anonymous());
        assert_eq!(identity, Identity::default());
        assert!(identity.role.is_empty());
    }

    #[test]
    fn test_project_identity() {
        let identity = Identity::project("proj-1", "merchant-1");
        assert_eq!(identity.id, "proj-1");
        assert_eq!(identity.role, roles::PROJECT);
        assert_eq!(identity.merchant_id, "merchant-1");
        assert!(identity.profile_id.is_empty());
    }

    #[test]
    fn test_system_identity_has_elevated_role() {
        let identity = Identity::system();
        assert_eq!(identity.role, roles::SYSTEM);
        assert!(!identity.is_anonymous());
    }

    #[test]
    fn test_builder() {
        let identity = Identity::default()
            .with_role("merchant")
            .with_merchant("m-1")
            .with_profile("p-1");
        assert_eq!(identity.role, "merchant");
        assert_eq!(identity.merchant_id, "m-1");
        assert_eq!(identity.profile_id, "p-1");
    }
}
