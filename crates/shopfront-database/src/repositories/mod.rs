//! PostgreSQL implementations of the store traits.

pub mod permission;
pub mod role;
pub mod user;

pub use permission::PermissionRepository;
pub use role::RoleRepository;
pub use user::UserRepository;

use shopfront_core::error::{AppError, ErrorKind};

/// Translate a failed write into the domain error it stands for.
///
/// Unique violations become `DuplicateResource`, restricted deletes become
/// `Conflict`, and dangling references become `NotFound`. Anything else is an
/// opaque database failure.
pub(crate) fn map_write_error(err: sqlx::Error, context: &str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return AppError::duplicate(duplicate_message(db_err.constraint()));
        }
        if db_err.is_foreign_key_violation() {
            return match db_err.constraint() {
                Some("user_roles_role_id_fkey") if context.starts_with("delete") => {
                    AppError::conflict("Role is still assigned to users")
                }
                Some("user_roles_role_id_fkey") => AppError::not_found("Role not found"),
                Some("role_permissions_permission_id_fkey") => {
                    AppError::not_found("Permission not found")
                }
                _ => AppError::not_found(format!("{context}: referenced record not found")),
            };
        }
    }
    AppError::with_source(ErrorKind::Database, format!("Failed to {context}"), err)
}

/// Wrap a failed read.
pub(crate) fn map_read_error(err: sqlx::Error, context: &str) -> AppError {
    AppError::with_source(ErrorKind::Database, format!("Failed to {context}"), err)
}

fn duplicate_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_username_lower_key") => "Username already exists",
        Some("users_email_lower_key") => "Email already in use",
        Some("roles_name_key") => "Role name already exists",
        Some("permissions_name_key") => "Permission name already exists",
        _ => "Resource already exists",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_messages_name_the_field() {
        assert_eq!(
            duplicate_message(Some("users_username_lower_key")),
            "Username already exists"
        );
        assert_eq!(
            duplicate_message(Some("users_email_lower_key")),
            "Email already in use"
        );
        assert_eq!(duplicate_message(None), "Resource already exists");
    }

    #[test]
    fn test_non_database_errors_stay_opaque() {
        let err = map_write_error(sqlx::Error::RowNotFound, "create user");
        assert_eq!(err.kind, ErrorKind::Database);
        assert_eq!(err.message, "Failed to create user");
    }
}
