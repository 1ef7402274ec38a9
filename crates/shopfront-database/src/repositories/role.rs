//! Role repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use shopfront_core::error::AppError;
use shopfront_core::result::AppResult;
use shopfront_core::types::{PermissionId, RoleId};
use shopfront_entity::permission::PermissionRef;
use shopfront_entity::role::{Role, RoleName};

use super::{map_read_error, map_write_error};
use crate::store::RoleStore;

const ROLE_COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Repository for roles and their permission sets.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    /// Create a new role repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_permissions(&self, mut role: Role) -> AppResult<Role> {
        let rows = sqlx::query_as::<_, (PermissionId, String)>(
            "SELECT p.id, p.name FROM role_permissions rp \
             JOIN permissions p ON p.id = rp.permission_id \
             WHERE rp.role_id = $1",
        )
        .bind(role.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "load role permissions"))?;

        role.permissions = rows
            .into_iter()
            .map(|(id, name)| PermissionRef { id, name })
            .collect();
        Ok(role)
    }

    async fn hydrate(&self, role: Option<Role>) -> AppResult<Option<Role>> {
        match role {
            Some(role) => self.with_permissions(role).await.map(Some),
            None => Ok(None),
        }
    }

    async fn insert_permissions(
        tx: &mut Transaction<'_, Postgres>,
        role: &Role,
    ) -> AppResult<()> {
        let permission_ids: Vec<Uuid> = role.permissions.iter().map(|p| p.id.into()).collect();
        if permission_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id) SELECT $1, UNNEST($2::uuid[])",
        )
        .bind(role.id)
        .bind(&permission_ids)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error(e, "attach role permissions"))?;
        Ok(())
    }
}

#[async_trait]
impl RoleStore for RoleRepository {
    async fn find_by_id(&self, id: RoleId) -> AppResult<Option<Role>> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1");
        let role = sqlx::query_as::<_, Role>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_read_error(e, "find role by id"))?;
        self.hydrate(role).await
    }

    async fn find_by_name(&self, name: &RoleName) -> AppResult<Option<Role>> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1");
        let role = sqlx::query_as::<_, Role>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_read_error(e, "find role by name"))?;
        self.hydrate(role).await
    }

    async fn list(&self) -> AppResult<Vec<Role>> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY name ASC");
        let mut roles = sqlx::query_as::<_, Role>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_read_error(e, "list roles"))?;

        let rows = sqlx::query_as::<_, (RoleId, PermissionId, String)>(
            "SELECT rp.role_id, p.id, p.name FROM role_permissions rp \
             JOIN permissions p ON p.id = rp.permission_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "list role permissions"))?;

        let mut by_role: HashMap<RoleId, Vec<PermissionRef>> = HashMap::new();
        for (role_id, id, name) in rows {
            by_role
                .entry(role_id)
                .or_default()
                .push(PermissionRef { id, name });
        }
        for role in &mut roles {
            if let Some(permissions) = by_role.remove(&role.id) {
                role.permissions = permissions.into_iter().collect();
            }
        }
        Ok(roles)
    }

    async fn insert_if_absent(&self, role: &Role) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_read_error(e, "begin transaction"))?;

        let result = sqlx::query(
            "INSERT INTO roles (id, name, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.created_at)
        .bind(role.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "seed role"))?;

        let inserted = result.rows_affected() == 1;
        if inserted {
            Self::insert_permissions(&mut tx, role).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, "commit role"))?;
        Ok(inserted)
    }

    async fn create(&self, role: &Role) -> AppResult<Role> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_read_error(e, "begin transaction"))?;

        sqlx::query(
            "INSERT INTO roles (id, name, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.created_at)
        .bind(role.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "create role"))?;

        Self::insert_permissions(&mut tx, role).await?;

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, "commit role"))?;
        Ok(role.clone())
    }

    async fn save(&self, role: &Role) -> AppResult<Role> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_read_error(e, "begin transaction"))?;

        let result = sqlx::query(
            "UPDATE roles SET name = $2, description = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "update role"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Role {} not found", role.id)));
        }

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "clear role permissions"))?;
        Self::insert_permissions(&mut tx, role).await?;

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, "commit role"))?;
        Ok(role.clone())
    }

    async fn delete(&self, id: RoleId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "delete role"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Role {id} not found")));
        }
        Ok(())
    }
}
