//! The authenticated caller.

use std::collections::BTreeSet;

use shopfront_core::types::UserId;
use shopfront_entity::role::{BuiltinRole, RoleName, RoleSet};
use shopfront_entity::user::User;

/// Caller identity resolved from a validated access token and the user's
/// *current* stored roles. Roles are never read from the token itself.
#[derive(Debug, Clone)]
pub struct Principal {
    /// The caller's user id.
    pub user_id: UserId,
    /// The caller's username.
    pub username: String,
    /// Roles held at resolution time.
    pub roles: RoleSet,
    /// Union of the permission names of every held role.
    pub permissions: BTreeSet<String>,
}

impl Principal {
    /// Builds a principal for `user` with the resolved permission names.
    pub fn new(user: &User, permissions: BTreeSet<String>) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            roles: user.roles.clone(),
            permissions,
        }
    }

    /// Whether the caller holds the named role.
    pub fn has_role(&self, name: &RoleName) -> bool {
        self.roles.contains(name)
    }

    /// Whether the caller holds the built-in role.
    pub fn has_builtin(&self, role: BuiltinRole) -> bool {
        self.roles.contains_builtin(role)
    }

    /// Whether the caller holds ADMIN or SUPER_ADMIN.
    pub fn is_privileged(&self) -> bool {
        self.roles
            .highest_builtin()
            .is_some_and(|role| role.is_privileged())
    }

    /// Whether any held role carries the named permission.
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(&name.to_ascii_uppercase())
    }

    /// Whether the caller is the given user.
    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
