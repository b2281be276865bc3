//! Role checks: pure functions of the current [`AuthState`].

use std::fmt;

use serde::{Deserialize, Serialize};
use vigil_session::AuthState;
use vigil_store::Role;

// ---------------------------------------------------------------------------
// RoleRequirement
// ---------------------------------------------------------------------------

/// The roles a route accepts.
///
/// Membership is literal. `Admin` does not satisfy an `Editor`-only
/// requirement unless the requirement lists both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRequirement {
    One(Role),
    AnyOf(Vec<Role>),
}

impl RoleRequirement {
    /// Whether `role` satisfies this requirement.
    pub fn accepts(&self, role: Role) -> bool {
        match self {
            Self::One(required) => *required == role,
            Self::AnyOf(roles) => roles.contains(&role),
        }
    }

    /// The accepted roles, in declaration order.
    pub fn roles(&self) -> &[Role] {
        match self {
            Self::One(role) => std::slice::from_ref(role),
            Self::AnyOf(roles) => roles,
        }
    }
}

impl From<Role> for RoleRequirement {
    fn from(role: Role) -> Self {
        Self::One(role)
    }
}

impl<const N: usize> From<[Role; N]> for RoleRequirement {
    fn from(roles: [Role; N]) -> Self {
        Self::AnyOf(roles.to_vec())
    }
}

impl From<&[Role]> for RoleRequirement {
    fn from(roles: &[Role]) -> Self {
        Self::AnyOf(roles.to_vec())
    }
}

impl From<Vec<Role>> for RoleRequirement {
    fn from(roles: Vec<Role>) -> Self {
        Self::AnyOf(roles)
    }
}

impl fmt::Display for RoleRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.roles().iter().map(Role::as_str).collect();
        match names.as_slice() {
            [] => write!(f, "nobody"),
            [only] => write!(f, "{only}"),
            [rest @ .., last] => write!(f, "{} or {last}", rest.join(", ")),
        }
    }
}

/// Whether the current session holds one of the required roles.
///
/// Always `false` unless authenticated.
pub fn has_role(state: &AuthState, required: impl Into<RoleRequirement>) -> bool {
    match state.role() {
        Some(role) => required.into().accepts(role),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// Convenience predicates projected from the current role.
///
/// Computed on demand from an [`AuthState`] and never stored, so they
/// can't drift from the user record after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub is_admin: bool,
    pub is_editor: bool,
    pub is_viewer: bool,
    pub can_edit: bool,
}

impl Permissions {
    pub fn of(state: &AuthState) -> Self {
        let role = state.role();
        let is_admin = role == Some(Role::Admin);
        let is_editor = role == Some(Role::Editor);
        Self {
            is_admin,
            is_editor,
            is_viewer: role == Some(Role::Viewer),
            can_edit: is_admin || is_editor,
        }
    }
}
