//! Role identifiers: a closed set of built-in roles plus custom names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use shopfront_core::AppError;

/// Longest accepted custom role name.
const MAX_ROLE_NAME_LEN: usize = 50;

/// Roles the system ships with and depends on.
///
/// Ordered by privilege: SuperAdmin > Admin > User.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuiltinRole {
    /// Default role for self-registered customers.
    User,
    /// Store administrator.
    Admin,
    /// Operator who may create other administrators.
    SuperAdmin,
}

impl BuiltinRole {
    /// Every built-in role, lowest privilege first.
    pub const ALL: [BuiltinRole; 3] = [Self::User, Self::Admin, Self::SuperAdmin];

    /// Return the canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        }
    }

    /// Description seeded at bootstrap.
    pub fn description(&self) -> &'static str {
        match self {
            Self::User => "Basic user role",
            Self::Admin => "Administrator role with higher privileges",
            Self::SuperAdmin => "Super administrator with all privileges",
        }
    }

    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::User => 1,
            Self::Admin => 2,
            Self::SuperAdmin => 3,
        }
    }

    /// Whether holding this role confers administrative power.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

impl fmt::Display for BuiltinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The name of a role.
///
/// Built-in names parse into [`RoleName::Builtin`] so privilege checks can
/// match exhaustively; anything else is a [`RoleName::Custom`] entry in the
/// open role table. Names are case-insensitive and stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoleName {
    /// One of the built-in roles.
    Builtin(BuiltinRole),
    /// An administrator-defined role.
    Custom(String),
}

impl RoleName {
    /// Return the canonical upper-case name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Builtin(role) => role.as_str(),
            Self::Custom(name) => name,
        }
    }

    /// Return the built-in role, if this is one.
    pub fn builtin(&self) -> Option<BuiltinRole> {
        match self {
            Self::Builtin(role) => Some(*role),
            Self::Custom(_) => None,
        }
    }

    /// Whether this names a built-in role.
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin(_))
    }
}

impl From<BuiltinRole> for RoleName {
    fn from(role: BuiltinRole) -> Self {
        Self::Builtin(role)
    }
}

impl PartialEq<BuiltinRole> for RoleName {
    fn eq(&self, other: &BuiltinRole) -> bool {
        self.builtin() == Some(*other)
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();

        if let Some(role) = BuiltinRole::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
        {
            return Ok(Self::Builtin(role));
        }

        if normalized.is_empty() || normalized.len() > MAX_ROLE_NAME_LEN {
            return Err(AppError::validation(format!(
                "Role name must be 1 to {MAX_ROLE_NAME_LEN} characters"
            )));
        }

        let valid = normalized
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if !valid || !normalized.starts_with(|c: char| c.is_ascii_uppercase()) {
            return Err(AppError::validation(format!(
                "Invalid role name '{s}': use letters, digits, and underscores, starting with a letter"
            )));
        }

        Ok(Self::Custom(normalized))
    }
}

impl TryFrom<String> for RoleName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoleName> for String {
    fn from(name: RoleName) -> Self {
        name.as_str().to_string()
    }
}

impl sqlx::Type<sqlx::Postgres> for RoleName {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for RoleName {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for RoleName {
    fn decode(
        value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <String as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        raw.parse::<RoleName>().map_err(Into::into)
    }
}
