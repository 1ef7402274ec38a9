//! User repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use shopfront_core::error::AppError;
use shopfront_core::result::AppResult;
use shopfront_core::types::{RoleId, UserId};
use shopfront_entity::role::{RoleName, RoleRef};
use shopfront_entity::user::User;

use super::{map_read_error, map_write_error};
use crate::store::UserStore;

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, phone, enabled, \
                            token_generation, created_at, updated_at";

/// Repository for user records and their role assignments.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, predicate: &str, value: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_read_error(e, "find user"))?;

        match user {
            Some(user) => self.with_roles(user).await.map(Some),
            None => Ok(None),
        }
    }

    async fn with_roles(&self, mut user: User) -> AppResult<User> {
        let rows = sqlx::query_as::<_, (RoleId, RoleName)>(
            "SELECT r.id, r.name FROM user_roles ur \
             JOIN roles r ON r.id = ur.role_id \
             WHERE ur.user_id = $1",
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "load user roles"))?;

        user.roles = rows
            .into_iter()
            .map(|(id, name)| RoleRef { id, name })
            .collect();
        Ok(user)
    }

    async fn replace_roles(
        tx: &mut Transaction<'_, Postgres>,
        user: &User,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user.id)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_write_error(e, "clear user roles"))?;

        let role_ids: Vec<Uuid> = user.roles.ids().into_iter().map(Uuid::from).collect();
        if role_ids.is_empty() {
            return Ok(());
        }

        sqlx::query("INSERT INTO user_roles (user_id, role_id) SELECT $1, UNNEST($2::uuid[])")
            .bind(user.id)
            .bind(&role_ids)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_write_error(e, "assign user roles"))?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_read_error(e, "find user by id"))?;

        match user {
            Some(user) => self.with_roles(user).await.map(Some),
            None => Ok(None),
        }
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.find_one("LOWER(username) = LOWER($1)", username).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_one("LOWER(email) = LOWER($1)", email).await
    }

    async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "check username"))
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "check email"))
    }

    async fn create(&self, user: &User) -> AppResult<User> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_read_error(e, "begin transaction"))?;

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, full_name, phone, enabled, \
                                token_generation, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.enabled)
        .bind(user.token_generation)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "create user"))?;

        Self::replace_roles(&mut tx, user).await?;

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, "commit user"))?;
        Ok(user.clone())
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_read_error(e, "begin transaction"))?;

        let result = sqlx::query(
            "UPDATE users SET username = $2, email = $3, password_hash = $4, full_name = $5, \
                              phone = $6, enabled = $7, \
                              token_generation = GREATEST(token_generation, $8), updated_at = $9 \
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.enabled)
        .bind(user.token_generation)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "update user"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {} not found", user.id)));
        }

        Self::replace_roles(&mut tx, user).await?;

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, "commit user"))?;
        Ok(user.clone())
    }

    async fn count_with_role(&self, role_id: RoleId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_roles WHERE role_id = $1")
            .bind(role_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_read_error(e, "count role holders"))?;
        Ok(count as u64)
    }
}
