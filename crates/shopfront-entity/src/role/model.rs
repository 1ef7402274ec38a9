//! Role entity model and the role set owned by a user.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use shopfront_core::types::{PermissionId, RoleId};

use super::name::{BuiltinRole, RoleName};
use crate::permission::PermissionRef;

/// A named bundle of permissions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Unique role identifier.
    pub id: RoleId,
    /// Unique role name.
    pub name: RoleName,
    /// Human-readable description.
    pub description: Option<String>,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
    /// When the role was last updated.
    pub updated_at: DateTime<Utc>,
    /// Permissions attached to this role.
    #[sqlx(skip)]
    #[serde(default)]
    pub permissions: BTreeSet<PermissionRef>,
}

impl Role {
    /// Build a new role with no permissions.
    pub fn new(name: RoleName, description: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: RoleId::new(),
            name,
            description,
            created_at: now,
            updated_at: now,
            permissions: BTreeSet::new(),
        }
    }

    /// Build the seeded row for a built-in role.
    pub fn builtin(role: BuiltinRole, now: DateTime<Utc>) -> Self {
        Self::new(role.into(), Some(role.description().to_string()), now)
    }

    /// A lightweight reference for embedding in a user's role set.
    pub fn to_ref(&self) -> RoleRef {
        RoleRef {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Whether this is one of the built-in roles.
    pub fn is_builtin(&self) -> bool {
        self.name.is_builtin()
    }

    /// Whether the permission is attached to this role.
    pub fn has_permission(&self, permission_id: PermissionId) -> bool {
        self.permissions.iter().any(|p| p.id == permission_id)
    }

    /// Names of all attached permissions.
    pub fn permission_names(&self) -> BTreeSet<String> {
        self.permissions.iter().map(|p| p.name.clone()).collect()
    }
}

/// Reference to a role held by a user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleRef {
    /// Role identifier.
    pub id: RoleId,
    /// Role name at the time the set was loaded.
    pub name: RoleName,
}

/// The set of roles owned by a user. No duplicates, order irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<RoleRef>);

impl RoleSet {
    /// Create an empty role set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role. Returns `false` if a role with the same id is already present.
    pub fn insert(&mut self, role: RoleRef) -> bool {
        if self.contains_id(role.id) {
            return false;
        }
        self.0.insert(role)
    }

    /// Remove a role by id. Returns `false` if it was not present.
    pub fn remove(&mut self, role_id: RoleId) -> bool {
        let before = self.0.len();
        self.0.retain(|r| r.id != role_id);
        self.0.len() != before
    }

    /// Whether a role with this id is present.
    pub fn contains_id(&self, role_id: RoleId) -> bool {
        self.0.iter().any(|r| r.id == role_id)
    }

    /// Whether a role with this name is present.
    pub fn contains(&self, name: &RoleName) -> bool {
        self.0.iter().any(|r| &r.name == name)
    }

    /// Whether the built-in role is present.
    pub fn contains_builtin(&self, role: BuiltinRole) -> bool {
        self.0.iter().any(|r| r.name == role)
    }

    /// Highest built-in role held, if any.
    pub fn highest_builtin(&self) -> Option<BuiltinRole> {
        self.0.iter().filter_map(|r| r.name.builtin()).max()
    }

    /// Iterate over the held roles.
    pub fn iter(&self) -> impl Iterator<Item = &RoleRef> {
        self.0.iter()
    }

    /// Role ids, for persistence.
    pub fn ids(&self) -> Vec<RoleId> {
        self.0.iter().map(|r| r.id).collect()
    }

    /// Role names as plain strings.
    pub fn names(&self) -> BTreeSet<String> {
        self.0.iter().map(|r| r.name.to_string()).collect()
    }

    /// Number of roles held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no roles are held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<RoleRef> for RoleSet {
    fn from_iter<I: IntoIterator<Item = RoleRef>>(iter: I) -> Self {
        let mut set = Self::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

/// Data required to create a custom role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    /// Desired role name.
    pub name: RoleName,
    /// Description.
    pub description: Option<String>,
    /// Names of permissions to attach on creation.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Data for updating a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRole {
    /// New name.
    pub name: RoleName,
    /// New description.
    pub description: Option<String>,
    /// Replacement permission set by name; `None` leaves permissions untouched.
    pub permissions: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role_ref(name: BuiltinRole) -> RoleRef {
        RoleRef {
            id: RoleId::new(),
            name: name.into(),
        }
    }

    #[test]
    fn test_role_set_rejects_duplicate_ids() {
        let user = role_ref(BuiltinRole::User);
        let mut set = RoleSet::new();
        assert!(set.insert(user.clone()));

        let renamed = RoleRef {
            id: user.id,
            name: RoleName::Custom("RENAMED".to_string()),
        };
        assert!(!set.insert(renamed));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_role_set_membership() {
        let admin = role_ref(BuiltinRole::Admin);
        let mut set: RoleSet = [role_ref(BuiltinRole::User), admin.clone()]
            .into_iter()
            .collect();

        assert!(set.contains_builtin(BuiltinRole::Admin));
        assert!(!set.contains_builtin(BuiltinRole::SuperAdmin));
        assert_eq!(set.highest_builtin(), Some(BuiltinRole::Admin));

        assert!(set.remove(admin.id));
        assert!(!set.remove(admin.id));
        assert_eq!(set.highest_builtin(), Some(BuiltinRole::User));
    }
}
