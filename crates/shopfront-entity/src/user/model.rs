//! User entity model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use shopfront_core::types::UserId;

use crate::role::{BuiltinRole, RoleName, RoleRef, RoleSet};

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login name (case-insensitive).
    pub username: String,
    /// Unique email address (case-insensitive).
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Full name.
    pub full_name: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Whether the account may authenticate.
    pub enabled: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// Refreshed on login, password change, and role mutation.
    pub updated_at: DateTime<Utc>,
    /// Stamped into every token issued; bumping it revokes all earlier tokens.
    #[serde(default)]
    pub token_generation: i32,
    /// Roles held by the user.
    #[sqlx(skip)]
    #[serde(default)]
    pub roles: RoleSet,
}

impl User {
    /// Build an enabled account with no roles from registration data.
    pub fn from_create(data: CreateUser, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            full_name: data.full_name,
            phone: data.phone,
            enabled: true,
            created_at: now,
            updated_at: now,
            token_generation: 0,
            roles: RoleSet::new(),
        }
    }

    /// Whether the user holds the named role.
    pub fn has_role(&self, name: &RoleName) -> bool {
        self.roles.contains(name)
    }

    /// Whether the user holds the built-in role.
    pub fn has_builtin(&self, role: BuiltinRole) -> bool {
        self.roles.contains_builtin(role)
    }

    /// Attach a role. Returns `false` if it was already held.
    pub fn grant(&mut self, role: RoleRef) -> bool {
        self.roles.insert(role)
    }

    /// Record a mutation at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Start a new token generation at `now`, invalidating every token
    /// issued under an earlier one.
    pub fn revoke_tokens(&mut self, now: DateTime<Utc>) {
        self.token_generation = self.token_generation.saturating_add(1);
        self.touch(now);
    }

    /// Role names as plain strings.
    pub fn role_names(&self) -> BTreeSet<String> {
        self.roles.names()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Full name.
    pub full_name: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}
