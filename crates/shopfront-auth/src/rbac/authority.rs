//! The role & permission authority.
//!
//! Owns the role/permission graph: seeds the built-in roles, answers
//! membership questions, and performs every role-related mutation behind
//! the [`RbacEnforcer`] gate. Each mutation re-reads the current persisted
//! aggregate before writing it back.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use shopfront_core::error::AppError;
use shopfront_core::result::AppResult;
use shopfront_core::traits::Clock;
use shopfront_core::types::{PermissionId, RoleId, UserId};
use shopfront_database::store::{PermissionStore, RoleStore, UserStore};
use shopfront_entity::permission::{CreatePermission, Permission, PermissionRef};
use shopfront_entity::role::{BuiltinRole, CreateRole, Role, RoleName, UpdateRole};
use shopfront_entity::user::User;

use super::enforcer::RbacEnforcer;
use super::policies::Capability;
use super::principal::Principal;

/// Manages roles, permissions, and user role assignments.
#[derive(Debug, Clone)]
pub struct RoleAuthority {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    permissions: Arc<dyn PermissionStore>,
    enforcer: RbacEnforcer,
    clock: Arc<dyn Clock>,
}

impl RoleAuthority {
    /// Create a new authority over the given stores.
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        permissions: Arc<dyn PermissionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            roles,
            permissions,
            enforcer: RbacEnforcer::new(),
            clock,
        }
    }

    /// Returns the authorization gate.
    pub fn enforcer(&self) -> &RbacEnforcer {
        &self.enforcer
    }

    // ── Bootstrap ──────────────────────────────────────────────────

    /// Ensure `USER`, `ADMIN` and `SUPER_ADMIN` exist.
    ///
    /// Safe to run on every start and from concurrently starting
    /// instances: each seed is a single insert guarded by the store's unique
    /// name constraint. Returns how many roles were created.
    pub async fn bootstrap_roles(&self) -> AppResult<usize> {
        let now = self.clock.now();
        let mut created = 0;

        for builtin in BuiltinRole::ALL {
            if self.roles.insert_if_absent(&Role::builtin(builtin, now)).await? {
                info!(role = %builtin, "Seeded built-in role");
                created += 1;
            } else {
                debug!(role = %builtin, "Built-in role already present");
            }
        }

        Ok(created)
    }

    /// Load a built-in role, failing if bootstrap has not run.
    pub async fn builtin_role(&self, builtin: BuiltinRole) -> AppResult<Role> {
        self.roles
            .find_by_name(&builtin.into())
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Role {builtin} not found; built-in roles have not been bootstrapped"
                ))
            })
    }

    // ── Built-in attachment ────────────────────────────────────────

    /// Attach a built-in role to the user's in-memory role set.
    ///
    /// Idempotent: returns `false` without error if the role is already held.
    /// The caller persists the user.
    pub async fn attach_builtin(&self, user: &mut User, builtin: BuiltinRole) -> AppResult<bool> {
        let role = self.builtin_role(builtin).await?;
        let added = user.grant(role.to_ref());
        if added {
            user.touch(self.clock.now());
        }
        Ok(added)
    }

    /// Attach `USER`.
    pub async fn add_default_role(&self, user: &mut User) -> AppResult<bool> {
        self.attach_builtin(user, BuiltinRole::User).await
    }

    /// Attach `ADMIN`.
    pub async fn add_admin_role(&self, user: &mut User) -> AppResult<bool> {
        self.attach_builtin(user, BuiltinRole::Admin).await
    }

    /// Attach `SUPER_ADMIN`.
    pub async fn add_super_admin_role(&self, user: &mut User) -> AppResult<bool> {
        self.attach_builtin(user, BuiltinRole::SuperAdmin).await
    }

    /// Pure membership predicate.
    pub fn has_role(&self, user: &User, name: &RoleName) -> bool {
        user.has_role(name)
    }

    // ── Principal resolution ───────────────────────────────────────

    /// Build the caller identity for a user from their current roles.
    pub async fn principal_for(&self, user: &User) -> AppResult<Principal> {
        let mut permissions = BTreeSet::new();
        for held in user.roles.iter() {
            if let Some(role) = self.roles.find_by_id(held.id).await? {
                permissions.extend(role.permission_names());
            }
        }
        Ok(Principal::new(user, permissions))
    }

    // ── Role reads ─────────────────────────────────────────────────

    /// Fetch a role by id.
    pub async fn get_role(&self, caller: &Principal, role_id: RoleId) -> AppResult<Role> {
        self.enforcer.require(caller, Capability::ViewRoles)?;
        self.load_role(role_id).await
    }

    /// Fetch a role by name.
    pub async fn get_role_by_name(&self, caller: &Principal, name: &RoleName) -> AppResult<Role> {
        self.enforcer.require(caller, Capability::ViewRoles)?;
        self.roles
            .find_by_name(name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role {name} not found")))
    }

    /// List every role.
    pub async fn list_roles(&self, caller: &Principal) -> AppResult<Vec<Role>> {
        self.enforcer.require(caller, Capability::ViewRoles)?;
        self.roles.list().await
    }

    // ── Role CRUD ──────────────────────────────────────────────────

    /// Create a custom role, optionally with an initial permission set.
    pub async fn create_role(&self, caller: &Principal, data: CreateRole) -> AppResult<Role> {
        self.enforcer.require(caller, Capability::ManageRoles)?;
        if !data.permissions.is_empty() {
            self.enforcer
                .require(caller, Capability::ManageRolePermissions)?;
        }

        let mut role = Role::new(data.name, data.description, self.clock.now());
        role.permissions = self.resolve_permissions(&data.permissions).await?;

        let role = self.roles.create(&role).await?;
        info!(role_id = %role.id, role = %role.name, by = %caller.username, "Role created");
        Ok(role)
    }

    /// Rename or re-describe a role, optionally replacing its permissions.
    ///
    /// Built-in roles keep their names.
    pub async fn update_role(
        &self,
        caller: &Principal,
        role_id: RoleId,
        data: UpdateRole,
    ) -> AppResult<Role> {
        self.enforcer.require(caller, Capability::ManageRoles)?;
        if data.permissions.is_some() {
            self.enforcer
                .require(caller, Capability::ManageRolePermissions)?;
        }

        let mut role = self.load_role(role_id).await?;
        if role.is_builtin() && data.name != role.name {
            return Err(AppError::conflict(format!(
                "Built-in role {} cannot be renamed",
                role.name
            )));
        }

        role.name = data.name;
        role.description = data.description;
        if let Some(names) = &data.permissions {
            role.permissions = self.resolve_permissions(names).await?;
        }
        role.updated_at = self.clock.now();

        let role = self.roles.save(&role).await?;
        info!(role_id = %role.id, role = %role.name, by = %caller.username, "Role updated");
        Ok(role)
    }

    /// Delete a custom role that no user holds.
    pub async fn delete_role(&self, caller: &Principal, role_id: RoleId) -> AppResult<()> {
        self.enforcer.require(caller, Capability::ManageRoles)?;

        let role = self.load_role(role_id).await?;
        if role.is_builtin() {
            return Err(AppError::conflict(format!(
                "Built-in role {} cannot be deleted",
                role.name
            )));
        }

        let holders = self.users.count_with_role(role_id).await?;
        if holders > 0 {
            return Err(AppError::conflict(format!(
                "Role {} is assigned to {holders} user(s)",
                role.name
            )));
        }

        self.roles.delete(role_id).await?;
        info!(role_id = %role_id, role = %role.name, by = %caller.username, "Role deleted");
        Ok(())
    }

    // ── Role permissions ───────────────────────────────────────────

    /// Attach a permission to a role. Fails with `Conflict` if already attached.
    pub async fn add_permission_to_role(
        &self,
        caller: &Principal,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<Role> {
        self.enforcer
            .require(caller, Capability::ManageRolePermissions)?;

        let mut role = self.load_role(role_id).await?;
        let permission = self.load_permission(permission_id).await?;
        if role.has_permission(permission_id) {
            return Err(AppError::conflict(format!(
                "Role {} already has permission {}",
                role.name, permission.name
            )));
        }

        role.permissions.insert(permission.to_ref());
        role.updated_at = self.clock.now();

        let role = self.roles.save(&role).await?;
        info!(
            role = %role.name,
            permission = %permission.name,
            by = %caller.username,
            "Permission attached to role"
        );
        Ok(role)
    }

    /// Detach a permission from a role. Fails with `Conflict` if not attached.
    pub async fn remove_permission_from_role(
        &self,
        caller: &Principal,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<Role> {
        self.enforcer
            .require(caller, Capability::ManageRolePermissions)?;

        let mut role = self.load_role(role_id).await?;
        let permission = self.load_permission(permission_id).await?;
        if !role.has_permission(permission_id) {
            return Err(AppError::conflict(format!(
                "Role {} does not have permission {}",
                role.name, permission.name
            )));
        }

        role.permissions.retain(|p| p.id != permission_id);
        role.updated_at = self.clock.now();

        let role = self.roles.save(&role).await?;
        info!(
            role = %role.name,
            permission = %permission.name,
            by = %caller.username,
            "Permission detached from role"
        );
        Ok(role)
    }

    // ── Permission catalogue ───────────────────────────────────────

    /// Add a permission to the catalogue.
    pub async fn create_permission(
        &self,
        caller: &Principal,
        data: CreatePermission,
    ) -> AppResult<Permission> {
        self.enforcer
            .require(caller, Capability::ManagePermissions)?;

        let name = Permission::normalize_name(&data.name)?;
        let permission = Permission::new(name, data.description, self.clock.now());
        let permission = self.permissions.create(&permission).await?;
        info!(permission = %permission.name, by = %caller.username, "Permission created");
        Ok(permission)
    }

    /// List the permission catalogue.
    pub async fn list_permissions(&self, caller: &Principal) -> AppResult<Vec<Permission>> {
        self.enforcer
            .require(caller, Capability::ViewPermissions)?;
        self.permissions.list().await
    }

    // ── User role administration ───────────────────────────────────

    /// Grant a role to a user. Fails with `Conflict` if already held.
    pub async fn add_role_to_user(
        &self,
        caller: &Principal,
        user_id: UserId,
        role_id: RoleId,
    ) -> AppResult<User> {
        let role = self.authorize_assignment(caller, role_id).await?;
        let mut user = self.load_user(user_id).await?;

        if !user.grant(role.to_ref()) {
            return Err(AppError::conflict(format!(
                "User {} already has role {}",
                user.username, role.name
            )));
        }
        user.touch(self.clock.now());

        let user = self.users.save(&user).await?;
        info!(
            user_id = %user.id,
            role = %role.name,
            by = %caller.username,
            "Role granted to user"
        );
        Ok(user)
    }

    /// Revoke a role from a user. Fails with `Conflict` if not held.
    pub async fn remove_role_from_user(
        &self,
        caller: &Principal,
        user_id: UserId,
        role_id: RoleId,
    ) -> AppResult<User> {
        let role = self.authorize_assignment(caller, role_id).await?;
        if caller.is(user_id) && role.name == BuiltinRole::SuperAdmin {
            return Err(AppError::conflict(
                "A super administrator cannot revoke their own SUPER_ADMIN role",
            ));
        }

        let mut user = self.load_user(user_id).await?;
        if !user.roles.remove(role_id) {
            return Err(AppError::conflict(format!(
                "User {} does not have role {}",
                user.username, role.name
            )));
        }
        user.touch(self.clock.now());

        let user = self.users.save(&user).await?;
        info!(
            user_id = %user.id,
            role = %role.name,
            by = %caller.username,
            "Role revoked from user"
        );
        Ok(user)
    }

    // ── Internals ──────────────────────────────────────────────────

    async fn authorize_assignment(&self, caller: &Principal, role_id: RoleId) -> AppResult<Role> {
        self.enforcer.require(caller, Capability::AssignRoles)?;
        let role = self.load_role(role_id).await?;
        if role.name.builtin().is_some_and(|b| b.is_privileged()) {
            self.enforcer
                .require(caller, Capability::AssignPrivilegedRoles)?;
        }
        Ok(role)
    }

    async fn load_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.roles
            .find_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role {role_id} not found")))
    }

    async fn load_permission(&self, permission_id: PermissionId) -> AppResult<Permission> {
        self.permissions
            .find_by_id(permission_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Permission {permission_id} not found")))
    }

    async fn load_user(&self, user_id: UserId) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    async fn resolve_permissions(&self, names: &[String]) -> AppResult<BTreeSet<PermissionRef>> {
        let mut resolved = BTreeSet::new();
        for raw in names {
            let name = Permission::normalize_name(raw)?;
            let permission = self
                .permissions
                .find_by_name(&name)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Permission {name} not found")))?;
            resolved.insert(permission.to_ref());
        }
        Ok(resolved)
    }
}
