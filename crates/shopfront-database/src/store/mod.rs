//! Store traits consumed by the auth core.
//!
//! Every write that must be unique (usernames, emails, role names,
//! permission names) is a single constrained operation in the store. Callers
//! never rely on an `exists_*` check followed by a write for correctness; the
//! existence checks only let them fail early with a friendlier message.

pub mod memory;

use std::fmt::Debug;

use async_trait::async_trait;

use shopfront_core::result::AppResult;
use shopfront_core::types::{PermissionId, RoleId, UserId};
use shopfront_entity::permission::Permission;
use shopfront_entity::role::{Role, RoleName};
use shopfront_entity::user::User;

/// Durable user records keyed by id, username, and email.
#[async_trait]
pub trait UserStore: Send + Sync + Debug + 'static {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a user by username (case-insensitive).
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Whether the username is taken (case-insensitive).
    async fn exists_by_username(&self, username: &str) -> AppResult<bool>;

    /// Whether the email is taken (case-insensitive).
    async fn exists_by_email(&self, email: &str) -> AppResult<bool>;

    /// Insert a new user together with its initial role set.
    ///
    /// All-or-nothing. Fails with `DuplicateResource` when the username or
    /// email is already taken, and `NotFound` when a referenced role is gone.
    async fn create(&self, user: &User) -> AppResult<User>;

    /// Overwrite an existing user's row and role set (last writer wins).
    async fn save(&self, user: &User) -> AppResult<User>;

    /// Number of users holding the role.
    async fn count_with_role(&self, role_id: RoleId) -> AppResult<u64>;
}

/// Role reference data and each role's permission set.
#[async_trait]
pub trait RoleStore: Send + Sync + Debug + 'static {
    /// Find a role by primary key.
    async fn find_by_id(&self, id: RoleId) -> AppResult<Option<Role>>;

    /// Find a role by name.
    async fn find_by_name(&self, name: &RoleName) -> AppResult<Option<Role>>;

    /// All roles ordered by name.
    async fn list(&self) -> AppResult<Vec<Role>>;

    /// Insert the role unless one with the same name exists.
    ///
    /// Returns `true` if this call inserted it. Safe under concurrent callers.
    async fn insert_if_absent(&self, role: &Role) -> AppResult<bool>;

    /// Insert a role, failing with `DuplicateResource` on a name collision.
    async fn create(&self, role: &Role) -> AppResult<Role>;

    /// Overwrite a role's name, description, and permission set.
    async fn save(&self, role: &Role) -> AppResult<Role>;

    /// Delete a role. Fails with `Conflict` while any user still holds it.
    async fn delete(&self, id: RoleId) -> AppResult<()>;
}

/// The permission catalogue.
#[async_trait]
pub trait PermissionStore: Send + Sync + Debug + 'static {
    /// Find a permission by primary key.
    async fn find_by_id(&self, id: PermissionId) -> AppResult<Option<Permission>>;

    /// Find a permission by its normalized name.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Permission>>;

    /// All permissions ordered by name.
    async fn list(&self) -> AppResult<Vec<Permission>>;

    /// Insert a permission, failing with `DuplicateResource` on a name collision.
    async fn create(&self, permission: &Permission) -> AppResult<Permission>;
}
