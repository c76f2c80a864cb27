//! Role-Based Access Control (RBAC)
//!
//! The policy maps a role to the `(resource, action)` pairs it may use.
//! Resources are matched route templates (`/admin/api/v1/reports/file`),
//! actions are lowercase HTTP methods. The policy is loaded once at start;
//! role inheritance is flattened at load time so evaluation never walks
//! the hierarchy and never needs mutable access.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Permission on a resource pattern
///
/// `*` matches any resource or action. A resource ending in `*` matches
/// every resource starting with the part before it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission {
    pub resource: String,
    pub action: String,
}

impl Permission {
    /// Create a new permission
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into().to_ascii_lowercase(),
        }
    }

    /// Parse `resource:action`
    ///
    /// The last colon separates the action, so resources may contain colons.
    pub fn from_string(s: &str) -> Result<Self, RbacError> {
        match s.rsplit_once(':') {
            Some((resource, action)) if !resource.is_empty() && !action.is_empty() => {
                Ok(Permission::new(resource, action))
            }
            _ => Err(RbacError::InvalidPermissionFormat(s.to_string())),
        }
    }

    /// Whether this permission grants `action` on `resource`
    pub fn matches(&self, resource: &str, action: &str) -> bool {
        let resource_match = match self.resource.strip_suffix('*') {
            Some("") => true,
            Some(prefix) => resource.starts_with(prefix),
            None => self.resource == resource,
        };
        let action_match = self.action == "*" || self.action.eq_ignore_ascii_case(action);
        resource_match && action_match
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

/// Role definition as written in the policy file
#[derive(Debug, Clone, Deserialize)]
pub struct Role {
    /// Role name
    pub name: String,

    /// Role description
    #[serde(default)]
    pub description: Option<String>,

    /// Permissions in `resource:action` form
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Parent roles (for role hierarchy)
    #[serde(default, alias = "inherits")]
    pub inherits_from: Vec<String>,
}

impl Role {
    /// Create a new role
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            permissions: Vec::new(),
            inherits_from: Vec::new(),
        }
    }

    /// Grant `resource:action`
    pub fn allow(mut self, resource: impl Into<String>, action: impl Into<String>) -> Self {
        self.permissions
            .push(format!("{}:{}", resource.into(), action.into()));
        self
    }

    /// Inherit every permission of `parent`
    pub fn inherit(mut self, parent: impl Into<String>) -> Self {
        self.inherits_from.push(parent.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    roles: Vec<Role>,
}

/// Read-only RBAC policy
#[derive(Debug, Clone, Default)]
pub struct RbacPolicy {
    /// Role name to its flattened permission set
    permissions: HashMap<String, Vec<Permission>>,
}

impl RbacPolicy {
    /// Build a policy, flattening inheritance
    pub fn from_roles(roles: Vec<Role>) -> Result<Self, RbacError> {
        let mut definitions: HashMap<String, Role> = HashMap::new();
        for role in roles {
            if role.name.is_empty() {
                return Err(RbacError::InvalidRole("role name cannot be empty".to_string()));
            }
            if definitions.contains_key(&role.name) {
                return Err(RbacError::DuplicateRole(role.name));
            }
            definitions.insert(role.name.clone(), role);
        }

        let mut permissions = HashMap::new();
        for name in definitions.keys() {
            let mut collected = HashSet::new();
            let mut path = Vec::new();
            collect_permissions(name, &definitions, &mut path, &mut collected)?;

            let mut flattened: Vec<Permission> = collected.into_iter().collect();
            flattened.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
            debug!(role = %name, permissions = flattened.len(), "Role loaded");
            permissions.insert(name.clone(), flattened);
        }

        Ok(Self { permissions })
    }

    /// Parse a TOML policy document
    pub fn from_toml_str(raw: &str) -> Result<Self, RbacError> {
        let file: PolicyFile = toml::from_str(raw)?;
        Self::from_roles(file.roles)
    }

    /// Load the policy file at `path`
    pub fn load(path: &Path) -> Result<Self, RbacError> {
        let raw = std::fs::read_to_string(path)?;
        let policy = Self::from_toml_str(&raw)?;
        info!(path = %path.display(), roles = policy.permissions.len(), "RBAC policy loaded");
        Ok(policy)
    }

    /// Decide whether `role` may perform `action` on `resource`
    ///
    /// Unknown roles, including the empty role, are denied.
    pub fn allowed(&self, role: &str, resource: &str, action: &str) -> bool {
        self.permissions
            .get(role)
            .map(|perms| perms.iter().any(|p| p.matches(resource, action)))
            .unwrap_or(false)
    }

    /// Names of all known roles
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.permissions.keys().map(String::as_str)
    }

    /// Flattened permissions of `role`
    pub fn permissions_of(&self, role: &str) -> Option<&[Permission]> {
        self.permissions.get(role).map(Vec::as_slice)
    }
}

fn collect_permissions(
    name: &str,
    definitions: &HashMap<String, Role>,
    path: &mut Vec<String>,
    collected: &mut HashSet<Permission>,
) -> Result<(), RbacError> {
    if path.iter().any(|seen| seen == name) {
        path.push(name.to_string());
        return Err(RbacError::CircularInheritance(path.join(" -> ")));
    }

    let role = definitions
        .get(name)
        .ok_or_else(|| RbacError::RoleNotFound(name.to_string()))?;

    for raw in &role.permissions {
        collected.insert(Permission::from_string(raw)?);
    }

    path.push(name.to_string());
    for parent in &role.inherits_from {
        collect_permissions(parent, definitions, path, collected)?;
    }
    path.pop();

    Ok(())
}

/// RBAC errors
#[derive(Debug, thiserror::Error)]
pub enum RbacError {
    #[error("Invalid permission format: {0}. Expected format: resource:action")]
    InvalidPermissionFormat(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Role not found: {0}")]
    RoleNotFound(String),

    #[error("Role defined more than once: {0}")]
    DuplicateRole(String),

    #[error("Circular role inheritance detected: {0}")]
    CircularInheritance(String),

    #[error("Failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse policy file: {0}")]
    Parse(#[from] toml::de::Error),
}
