//! Permission entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use shopfront_core::AppError;
use shopfront_core::types::PermissionId;

/// Longest accepted permission name.
const MAX_PERMISSION_NAME_LEN: usize = 100;

/// An atomic capability attachable to one or more roles.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    /// Unique permission identifier.
    pub id: PermissionId,
    /// Unique permission name, e.g. `PRODUCT_WRITE`.
    pub name: String,
    /// Human-readable description.
    pub description: Option<String>,
    /// When the permission was created.
    pub created_at: DateTime<Utc>,
}

impl Permission {
    /// Build a new permission from a validated name.
    pub fn new(name: String, description: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: PermissionId::new(),
            name,
            description,
            created_at: now,
        }
    }

    /// Normalize a permission name to its stored form.
    ///
    /// Names are upper-cased; letters, digits, `_`, `:` and `.` are allowed.
    pub fn normalize_name(raw: &str) -> Result<String, AppError> {
        let name = raw.trim().to_ascii_uppercase();
        if name.is_empty() || name.len() > MAX_PERMISSION_NAME_LEN {
            return Err(AppError::validation(format!(
                "Permission name must be 1 to {MAX_PERMISSION_NAME_LEN} characters"
            )));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.'))
        {
            return Err(AppError::validation(format!(
                "Invalid permission name '{raw}'"
            )));
        }
        Ok(name)
    }

    /// A lightweight reference for embedding in a role.
    pub fn to_ref(&self) -> PermissionRef {
        PermissionRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Reference to a permission attached to a role.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionRef {
    /// Permission identifier.
    pub id: PermissionId,
    /// Permission name.
    pub name: String,
}

/// Data required to create a permission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    /// Desired name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(
            Permission::normalize_name(" product:write ").unwrap(),
            "PRODUCT:WRITE"
        );
        assert!(Permission::normalize_name("").is_err());
        assert!(Permission::normalize_name("drop table;").is_err());
    }
}
