use serde::{Deserialize, Serialize};

/// Grants everything; use sparingly.
pub const ALL_PERMISSIONS: &str = "*";

/// The resolved caller behind an API token, as stored in the token hash.
///
/// Permissions are `<area>:read` / `<area>:write` strings; the server
/// defines the concrete set per route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub actor: String,
    pub permissions: Vec<String>,
}

impl Identity {
    pub fn new(actor: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            actor: actor.into(),
            permissions,
        }
    }

    pub fn admin(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            permissions: vec![ALL_PERMISSIONS.to_string()],
        }
    }

    pub fn can(&self, permission: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p == permission || p == ALL_PERMISSIONS)
    }
}
