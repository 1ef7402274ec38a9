//! Unified application error types for Shopfront.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The boundary layer translates
//! [`ErrorKind`] into transport-specific status codes.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Bad credentials. Never says which of username or password was wrong.
    AuthenticationFailed,
    /// A unique username, email, role name, or permission name is already taken.
    DuplicateResource,
    /// A referenced user, role, or permission does not exist.
    NotFound,
    /// The token is malformed, unsigned, tampered, revoked, or of the wrong type.
    InvalidToken,
    /// The token is structurally valid but past its expiry.
    TokenExpired,
    /// The target or caller lacks a role the operation requires.
    InvalidRole,
    /// The caller lacks the privilege to perform the action.
    AuthorizationFailed,
    /// An exact-state transition was violated.
    Conflict,
    /// Input validation failed.
    Validation,
    /// An internal error occurred.
    Internal,
    /// A database error occurred.
    Database,
    /// A cache error occurred.
    Cache,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticationFailed => write!(f, "AUTHENTICATION_FAILED"),
            Self::DuplicateResource => write!(f, "DUPLICATE_RESOURCE"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::InvalidToken => write!(f, "INVALID_TOKEN"),
            Self::TokenExpired => write!(f, "TOKEN_EXPIRED"),
            Self::InvalidRole => write!(f, "INVALID_ROLE"),
            Self::AuthorizationFailed => write!(f, "AUTHORIZATION_FAILED"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Cache => write!(f, "CACHE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
        }
    }
}

/// The unified application error used throughout Shopfront.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an authentication-failed error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthenticationFailed, message)
    }

    /// Create a duplicate-resource error.
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateResource, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an invalid-token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, message)
    }

    /// Create a token-expired error.
    pub fn token_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenExpired, message)
    }

    /// Create an invalid-role error.
    pub fn invalid_role(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRole, message)
    }

    /// Create an authorization-failed error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthorizationFailed, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Whether this error came from a collaborator failure rather than a
    /// domain rule. Such errors are propagated as-is and never retried here.
    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Internal
                | ErrorKind::Database
                | ErrorKind::Cache
                | ErrorKind::Configuration
                | ErrorKind::Serialization
        )
    }

    /// Returns the underlying cause downcast to `E`, if it is one.
    pub fn source_as<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_deref().and_then(|s| s.downcast_ref::<E>())
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_display_uses_kind_code() {
        let err = AppError::token_expired("Token has expired");
        assert_eq!(err.to_string(), "TOKEN_EXPIRED: Token has expired");
    }

    #[test]
    fn test_internal_classification() {
        assert!(AppError::database("down").is_internal());
        assert!(AppError::cache("down").is_internal());
        assert!(!AppError::conflict("twice").is_internal());
        assert!(!AppError::authentication("nope").is_internal());
    }

    #[test]
    fn test_source_downcast() {
        let err = AppError::with_source(ErrorKind::Internal, "wrapped", Boom);
        assert!(err.source_as::<Boom>().is_some());
        assert!(err.clone().source_as::<Boom>().is_none());
    }
}
