//! Permission repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use shopfront_core::result::AppResult;
use shopfront_core::types::PermissionId;
use shopfront_entity::permission::Permission;

use super::{map_read_error, map_write_error};
use crate::store::PermissionStore;

/// Repository for the permission catalogue.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    /// Create a new permission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionStore for PermissionRepository {
    async fn find_by_id(&self, id: PermissionId) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, created_at FROM permissions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "find permission by id"))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, created_at FROM permissions WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "find permission by name"))
    }

    async fn list(&self) -> AppResult<Vec<Permission>> {
        sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, created_at FROM permissions ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_read_error(e, "list permissions"))
    }

    async fn create(&self, permission: &Permission) -> AppResult<Permission> {
        sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (id, name, description, created_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, description, created_at",
        )
        .bind(permission.id)
        .bind(&permission.name)
        .bind(&permission.description)
        .bind(permission.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "create permission"))
    }
}
