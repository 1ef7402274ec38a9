//! RBAC enforcement: checks whether a caller holds a required capability.

use tracing::warn;

use shopfront_core::error::AppError;
use shopfront_entity::role::BuiltinRole;

use super::policies::{Capability, RbacPolicies};
use super::principal::Principal;

/// The authorization gate run before every privileged operation.
#[derive(Debug, Clone, Default)]
pub struct RbacEnforcer {
    /// The policy configuration.
    policies: RbacPolicies,
}

impl RbacEnforcer {
    /// Creates a new enforcer with the default policy set.
    pub fn new() -> Self {
        Self {
            policies: RbacPolicies::new(),
        }
    }

    /// Whether any of the caller's built-in roles confers the capability.
    pub fn allows(&self, caller: &Principal, capability: Capability) -> bool {
        BuiltinRole::ALL
            .into_iter()
            .filter(|role| caller.has_builtin(*role))
            .any(|role| self.policies.has_capability(role, capability))
    }

    /// Fails with `AuthorizationFailed` unless the caller holds the capability.
    pub fn require(&self, caller: &Principal, capability: Capability) -> Result<(), AppError> {
        if self.allows(caller, capability) {
            return Ok(());
        }

        warn!(
            user_id = %caller.user_id,
            capability = ?capability,
            "Authorization denied"
        );
        Err(AppError::authorization(format!(
            "Caller lacks the '{}' capability",
            capability_name(capability)
        )))
    }

    /// Returns a reference to the underlying policies.
    pub fn policies(&self) -> &RbacPolicies {
        &self.policies
    }
}

fn capability_name(capability: Capability) -> &'static str {
    match capability {
        Capability::RegisterAdmin => "register_admin",
        Capability::RegisterSuperAdmin => "register_super_admin",
        Capability::ResetSuperAdminPassword => "reset_super_admin_password",
        Capability::AssignRoles => "assign_roles",
        Capability::AssignPrivilegedRoles => "assign_privileged_roles",
        Capability::ViewRoles => "view_roles",
        Capability::ManageRoles => "manage_roles",
        Capability::ManageRolePermissions => "manage_role_permissions",
        Capability::ViewPermissions => "view_permissions",
        Capability::ManagePermissions => "manage_permissions",
    }
}
