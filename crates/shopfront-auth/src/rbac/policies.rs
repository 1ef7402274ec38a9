//! Role-to-capability mapping definitions.

use serde::{Deserialize, Serialize};

use shopfront_entity::role::BuiltinRole;

/// A system-level capability checked before any privileged mutation.
///
/// Custom roles never grant capabilities; they only carry data-level
/// permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    // Accounts
    /// Register a user with the ADMIN role.
    RegisterAdmin,
    /// Register a user with the SUPER_ADMIN role.
    RegisterSuperAdmin,
    /// Reset the password of a SUPER_ADMIN account.
    ResetSuperAdminPassword,

    // Role assignment
    /// Grant or revoke non-privileged roles on users.
    AssignRoles,
    /// Grant or revoke ADMIN and SUPER_ADMIN on users.
    AssignPrivilegedRoles,

    // Roles
    /// Read role definitions.
    ViewRoles,
    /// Create, update, and delete roles.
    ManageRoles,
    /// Attach and detach permissions on roles.
    ManageRolePermissions,

    // Permissions
    /// Read the permission catalogue.
    ViewPermissions,
    /// Add permissions to the catalogue.
    ManagePermissions,
}

const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::AssignRoles,
    Capability::ViewRoles,
    Capability::ManageRoles,
    Capability::ViewPermissions,
];

const SUPER_ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::RegisterAdmin,
    Capability::RegisterSuperAdmin,
    Capability::ResetSuperAdminPassword,
    Capability::AssignRoles,
    Capability::AssignPrivilegedRoles,
    Capability::ViewRoles,
    Capability::ManageRoles,
    Capability::ManageRolePermissions,
    Capability::ViewPermissions,
    Capability::ManagePermissions,
];

/// Defines which capabilities each built-in role confers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RbacPolicies;

impl RbacPolicies {
    /// Creates the default policy set.
    pub fn new() -> Self {
        Self
    }

    /// Returns the capabilities conferred by the given role.
    pub fn capabilities(&self, role: BuiltinRole) -> &'static [Capability] {
        match role {
            BuiltinRole::User => &[],
            BuiltinRole::Admin => ADMIN_CAPABILITIES,
            BuiltinRole::SuperAdmin => SUPER_ADMIN_CAPABILITIES,
        }
    }

    /// Checks whether the given role confers the capability.
    pub fn has_capability(&self, role: BuiltinRole, capability: Capability) -> bool {
        self.capabilities(role).contains(&capability)
    }
}
