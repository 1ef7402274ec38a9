//! Inbound registration payloads.

use std::fmt;

use serde::Deserialize;
use validator::Validate;

use shopfront_core::error::AppError;

/// Data submitted to create an account at any privilege tier.
#[derive(Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username.
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    /// Email address.
    #[validate(email, length(max = 254))]
    pub email: String,
    /// Plaintext password. Policy is applied by the password validator.
    pub password: String,
    /// Full name.
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    /// Phone number.
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

impl RegisterRequest {
    /// Builds a request with only the required fields.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            full_name: None,
            phone: None,
        }
    }

    /// Sets the full name.
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Sets the phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Trims identity fields and runs the field rules.
    pub(crate) fn normalized(mut self) -> Result<Self, AppError> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self.validate()
            .map_err(|e| AppError::validation(format!("Invalid registration: {e}")))?;
        Ok(self)
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"****")
            .field("full_name", &self.full_name)
            .field("phone", &self.phone)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_core::error::ErrorKind;

    #[test]
    fn test_normalized_trims_identity_fields() {
        let request = RegisterRequest::new("  alice ", " alice@x.com", "pw123")
            .normalized()
            .unwrap();
        assert_eq!(request.username, "alice");
        assert_eq!(request.email, "alice@x.com");
    }

    #[test]
    fn test_field_rules() {
        let err = RegisterRequest::new("al", "alice@x.com", "pw123")
            .normalized()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        assert!(
            RegisterRequest::new("alice", "not-an-email", "pw123")
                .normalized()
                .is_err()
        );
        assert!(
            RegisterRequest::new("alice", "alice@x.com", "pw123")
                .with_phone("1".repeat(40))
                .normalized()
                .is_err()
        );
    }

    #[test]
    fn test_debug_masks_password() {
        let request = RegisterRequest::new("alice", "alice@x.com", "hunter2");
        let debug = format!("{request:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("alice@x.com"));
    }
}
