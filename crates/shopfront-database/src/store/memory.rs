//! In-process store implementation.
//!
//! All records and unique indexes live behind one async mutex, so each
//! uniqueness check and the write it guards form a single critical section.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use shopfront_core::error::AppError;
use shopfront_core::result::AppResult;
use shopfront_core::types::{PermissionId, RoleId, UserId};
use shopfront_entity::permission::Permission;
use shopfront_entity::role::{Role, RoleName, RoleSet};
use shopfront_entity::user::User;

use super::{PermissionStore, RoleStore, UserStore};

/// Users, roles, and permissions held in memory.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    usernames: HashMap<String, UserId>,
    emails: HashMap<String, UserId>,
    roles: HashMap<RoleId, Role>,
    role_names: HashMap<RoleName, RoleId>,
    permissions: HashMap<PermissionId, Permission>,
    permission_names: HashMap<String, PermissionId>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

impl State {
    /// Return a copy of the user with role names refreshed from the role table.
    fn hydrate_user(&self, user: &User) -> User {
        let mut user = user.clone();
        user.roles = user
            .roles
            .iter()
            .filter_map(|r| self.roles.get(&r.id).map(Role::to_ref))
            .collect();
        user
    }

    fn user_by_key(&self, index: &HashMap<String, UserId>, key: &str) -> Option<User> {
        index
            .get(&fold(key))
            .and_then(|id| self.users.get(id))
            .map(|u| self.hydrate_user(u))
    }

    fn check_roles_exist(&self, roles: &RoleSet) -> AppResult<()> {
        match roles.iter().find(|r| !self.roles.contains_key(&r.id)) {
            Some(missing) => Err(AppError::not_found(format!(
                "Role '{}' not found",
                missing.name
            ))),
            None => Ok(()),
        }
    }

    fn check_user_keys_free(&self, user: &User) -> AppResult<()> {
        if let Some(owner) = self.usernames.get(&fold(&user.username)) {
            if *owner != user.id {
                return Err(AppError::duplicate(format!(
                    "Username '{}' already exists",
                    user.username
                )));
            }
        }
        if let Some(owner) = self.emails.get(&fold(&user.email)) {
            if *owner != user.id {
                return Err(AppError::duplicate("Email already in use"));
            }
        }
        Ok(())
    }

    fn check_permissions_exist(&self, role: &Role) -> AppResult<()> {
        match role
            .permissions
            .iter()
            .find(|p| !self.permissions.contains_key(&p.id))
        {
            Some(missing) => Err(AppError::not_found(format!(
                "Permission '{}' not found",
                missing.name
            ))),
            None => Ok(()),
        }
    }

    fn check_role_name_free(&self, role: &Role) -> AppResult<()> {
        match self.role_names.get(&role.name) {
            Some(owner) if *owner != role.id => Err(AppError::duplicate(format!(
                "Role '{}' already exists",
                role.name
            ))),
            _ => Ok(()),
        }
    }

    fn insert_role(&mut self, role: &Role) {
        self.role_names.insert(role.name.clone(), role.id);
        self.roles.insert(role.id, role.clone());
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).map(|u| state.hydrate_user(u)))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.user_by_key(&state.usernames, username))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.user_by_key(&state.emails, email))
    }

    async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state.usernames.contains_key(&fold(username)))
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state.emails.contains_key(&fold(email)))
    }

    async fn create(&self, user: &User) -> AppResult<User> {
        let mut state = self.state.lock().await;

        if state.users.contains_key(&user.id) {
            return Err(AppError::duplicate(format!("User {} already exists", user.id)));
        }
        state.check_user_keys_free(user)?;
        state.check_roles_exist(&user.roles)?;

        state.usernames.insert(fold(&user.username), user.id);
        state.emails.insert(fold(&user.email), user.id);
        state.users.insert(user.id, user.clone());

        debug!(user_id = %user.id, "Stored new user");
        Ok(state.hydrate_user(user))
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        let mut state = self.state.lock().await;

        let previous = state
            .users
            .get(&user.id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("User {} not found", user.id)))?;
        state.check_user_keys_free(user)?;
        state.check_roles_exist(&user.roles)?;

        // Token generations only move forward, whatever a stale copy says.
        let mut stored = user.clone();
        stored.token_generation = stored.token_generation.max(previous.token_generation);

        state.usernames.remove(&fold(&previous.username));
        state.emails.remove(&fold(&previous.email));
        state.usernames.insert(fold(&user.username), user.id);
        state.emails.insert(fold(&user.email), user.id);
        state.users.insert(user.id, stored.clone());

        Ok(state.hydrate_user(&stored))
    }

    async fn count_with_role(&self, role_id: RoleId) -> AppResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.roles.contains_id(role_id))
            .count() as u64)
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find_by_id(&self, id: RoleId) -> AppResult<Option<Role>> {
        let state = self.state.lock().await;
        Ok(state.roles.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &RoleName) -> AppResult<Option<Role>> {
        let state = self.state.lock().await;
        Ok(state
            .role_names
            .get(name)
            .and_then(|id| state.roles.get(id))
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<Role>> {
        let state = self.state.lock().await;
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(roles)
    }

    async fn insert_if_absent(&self, role: &Role) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if state.role_names.contains_key(&role.name) {
            return Ok(false);
        }
        state.check_permissions_exist(role)?;
        state.insert_role(role);
        Ok(true)
    }

    async fn create(&self, role: &Role) -> AppResult<Role> {
        let mut state = self.state.lock().await;
        if state.role_names.contains_key(&role.name) {
            return Err(AppError::duplicate(format!(
                "Role '{}' already exists",
                role.name
            )));
        }
        state.check_permissions_exist(role)?;
        state.insert_role(role);
        Ok(role.clone())
    }

    async fn save(&self, role: &Role) -> AppResult<Role> {
        let mut state = self.state.lock().await;

        let previous = state
            .roles
            .get(&role.id)
            .map(|r| r.name.clone())
            .ok_or_else(|| AppError::not_found(format!("Role {} not found", role.id)))?;
        state.check_role_name_free(role)?;
        state.check_permissions_exist(role)?;

        state.role_names.remove(&previous);
        state.insert_role(role);
        Ok(role.clone())
    }

    async fn delete(&self, id: RoleId) -> AppResult<()> {
        let mut state = self.state.lock().await;

        let name = state
            .roles
            .get(&id)
            .map(|r| r.name.clone())
            .ok_or_else(|| AppError::not_found(format!("Role {id} not found")))?;

        let holders = state
            .users
            .values()
            .filter(|u| u.roles.contains_id(id))
            .count();
        if holders > 0 {
            return Err(AppError::conflict(format!(
                "Role '{name}' is still assigned to {holders} user(s)"
            )));
        }

        state.roles.remove(&id);
        state.role_names.remove(&name);
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn find_by_id(&self, id: PermissionId) -> AppResult<Option<Permission>> {
        let state = self.state.lock().await;
        Ok(state.permissions.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        let state = self.state.lock().await;
        Ok(state
            .permission_names
            .get(name)
            .and_then(|id| state.permissions.get(id))
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<Permission>> {
        let state = self.state.lock().await;
        let mut permissions: Vec<Permission> = state.permissions.values().cloned().collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(permissions)
    }

    async fn create(&self, permission: &Permission) -> AppResult<Permission> {
        let mut state = self.state.lock().await;
        if state.permission_names.contains_key(&permission.name) {
            return Err(AppError::duplicate(format!(
                "Permission '{}' already exists",
                permission.name
            )));
        }
        state
            .permission_names
            .insert(permission.name.clone(), permission.id);
        state.permissions.insert(permission.id, permission.clone());
        Ok(permission.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shopfront_core::error::ErrorKind;
    use shopfront_entity::role::BuiltinRole;
    use shopfront_entity::user::CreateUser;

    fn with_role(mut user: User, role: &Role) -> User {
        user.grant(role.to_ref());
        user
    }

    fn user(username: &str, email: &str) -> User {
        User::from_create(
            CreateUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: "$argon2id$stub".to_string(),
                full_name: None,
                phone: None,
            },
            Utc::now(),
        )
    }

    async fn seeded() -> (MemoryStore, Role) {
        let store = MemoryStore::new();
        let role = Role::builtin(BuiltinRole::User, Utc::now());
        RoleStore::create(&store, &role).await.unwrap();
        (store, role)
    }

    #[tokio::test]
    async fn test_create_and_lookup_case_insensitive() {
        let (store, role) = seeded().await;
        let users: &dyn UserStore = &store;

        users
            .create(&with_role(user("Alice", "Alice@X.com"), &role))
            .await
            .unwrap();

        let found = users.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.username, "Alice");
        assert!(found.has_builtin(BuiltinRole::User));
        assert!(users.exists_by_email("alice@x.COM").await.unwrap());
        assert!(users.find_by_email("bob@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email_rejected() {
        let store = MemoryStore::new();
        let users: &dyn UserStore = &store;
        users.create(&user("alice", "alice@x.com")).await.unwrap();

        let err = users.create(&user("ALICE", "other@x.com")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateResource);

        let err = users.create(&user("bob", "alice@x.com")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateResource);
    }

    #[tokio::test]
    async fn test_create_with_unknown_role_writes_nothing() {
        let store = MemoryStore::new();
        let users: &dyn UserStore = &store;
        let ghost = Role::builtin(BuiltinRole::Admin, Utc::now());

        let err = users
            .create(&with_role(user("alice", "alice@x.com"), &ghost))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(!users.exists_by_username("alice").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_have_one_winner() {
        let store = MemoryStore::new();
        let attempts = (0..16).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { UserStore::create(&store, &user("alice", "alice@x.com")).await })
        });

        let results = futures::future::join_all(attempts).await;
        let (ok, err): (Vec<_>, Vec<_>) = results
            .into_iter()
            .map(|joined| joined.unwrap())
            .partition(Result::is_ok);

        assert_eq!(ok.len(), 1);
        assert_eq!(err.len(), 15);
        assert!(
            err.into_iter()
                .all(|r| r.unwrap_err().kind == ErrorKind::DuplicateResource)
        );
    }

    #[tokio::test]
    async fn test_save_reindexes_username() {
        let store = MemoryStore::new();
        let users: &dyn UserStore = &store;
        let mut alice = users.create(&user("alice", "alice@x.com")).await.unwrap();

        alice.username = "alicia".to_string();
        users.save(&alice).await.unwrap();

        assert!(!users.exists_by_username("alice").await.unwrap());
        assert!(users.exists_by_username("alicia").await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_save_keeps_newer_token_generation() {
        let (store, role) = seeded().await;
        let alice = with_role(user("alice", "alice@x.com"), &role);
        UserStore::create(&store, &alice).await.unwrap();

        let stale = alice.clone();
        let mut reset = alice;
        reset.revoke_tokens(Utc::now());
        UserStore::save(&store, &reset).await.unwrap();

        let saved = UserStore::save(&store, &stale).await.unwrap();
        assert_eq!(saved.token_generation, 1);
        let found = UserStore::find_by_id(&store, reset.id).await.unwrap().unwrap();
        assert_eq!(found.token_generation, 1);
    }

    #[tokio::test]
    async fn test_save_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let err = UserStore::save(&store, &user("ghost", "ghost@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_insert_if_absent_is_idempotent() {
        let store = MemoryStore::new();
        let roles: &dyn RoleStore = &store;

        let first = Role::builtin(BuiltinRole::Admin, Utc::now());
        let second = Role::builtin(BuiltinRole::Admin, Utc::now());
        assert!(roles.insert_if_absent(&first).await.unwrap());
        assert!(!roles.insert_if_absent(&second).await.unwrap());

        assert_eq!(roles.list().await.unwrap().len(), 1);
        let stored = roles
            .find_by_name(&BuiltinRole::Admin.into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, first.id);
    }

    #[tokio::test]
    async fn test_delete_assigned_role_is_conflict() {
        let (store, role) = seeded().await;
        UserStore::create(&store, &with_role(user("alice", "alice@x.com"), &role))
            .await
            .unwrap();

        let roles: &dyn RoleStore = &store;
        let err = roles.delete(role.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(roles.find_by_id(role.id).await.unwrap().is_some());
        assert_eq!(UserStore::count_with_role(&store, role.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_role_rename_is_visible_through_users() {
        let store = MemoryStore::new();
        let mut role = Role::new("STAFF".parse().unwrap(), None, Utc::now());
        RoleStore::create(&store, &role).await.unwrap();
        let alice = UserStore::create(&store, &with_role(user("alice", "alice@x.com"), &role))
            .await
            .unwrap();

        role.name = "WAREHOUSE".parse().unwrap();
        RoleStore::save(&store, &role).await.unwrap();

        let reloaded = UserStore::find_by_id(&store, alice.id).await.unwrap().unwrap();
        assert!(reloaded.has_role(&"warehouse".parse().unwrap()));
        assert!(!reloaded.has_role(&"staff".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_role_rename_collision_is_duplicate() {
        let store = MemoryStore::new();
        let roles: &dyn RoleStore = &store;
        roles
            .create(&Role::new("STAFF".parse().unwrap(), None, Utc::now()))
            .await
            .unwrap();
        let mut other = Role::new("AUDITOR".parse().unwrap(), None, Utc::now());
        roles.create(&other).await.unwrap();

        other.name = "STAFF".parse().unwrap();
        let err = roles.save(&other).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateResource);
    }

    #[tokio::test]
    async fn test_role_with_unknown_permission_is_rejected() {
        let store = MemoryStore::new();
        let permission = Permission::new("PRODUCT_WRITE".to_string(), None, Utc::now());
        let mut role = Role::new("STAFF".parse().unwrap(), None, Utc::now());
        role.permissions.insert(permission.to_ref());

        let err = RoleStore::create(&store, &role).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        PermissionStore::create(&store, &permission).await.unwrap();
        let stored = RoleStore::create(&store, &role).await.unwrap();
        assert!(stored.has_permission(permission.id));
    }

    #[tokio::test]
    async fn test_duplicate_permission_name_rejected() {
        let store = MemoryStore::new();
        let permissions: &dyn PermissionStore = &store;
        permissions
            .create(&Permission::new("ORDER_READ".to_string(), None, Utc::now()))
            .await
            .unwrap();
        let err = permissions
            .create(&Permission::new("ORDER_READ".to_string(), None, Utc::now()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateResource);
        assert!(permissions.find_by_name("ORDER_READ").await.unwrap().is_some());
    }
}
