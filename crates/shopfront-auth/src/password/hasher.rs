//! Argon2id password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use shopfront_core::config::AuthConfig;
use shopfront_core::error::AppError;

/// One-way credential transform with verification.
pub trait CredentialHasher: Send + Sync + std::fmt::Debug + 'static {
    /// Hashes a plaintext password into a self-describing digest.
    fn hash(&self, plaintext: &str) -> Result<String, AppError>;

    /// Checks a plaintext password against a stored digest.
    ///
    /// `Ok(false)` means a mismatch; `Err` means the digest itself is unusable.
    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AppError>;
}

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Creates a hasher with the configured cost parameters.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| AppError::configuration(format!("Invalid Argon2 parameters: {e}")))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialHasher for PasswordHasher {
    /// Hashes a plaintext password using Argon2id with a random salt.
    fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored PHC string. The cost
    /// parameters embedded in the digest win over the configured ones.
    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(digest)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        match self.argon2().verify_password(plaintext.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_core::error::ErrorKind;

    fn cheap() -> PasswordHasher {
        PasswordHasher::new(&AuthConfig {
            argon2_memory_kib: 8,
            argon2_iterations: 1,
            argon2_parallelism: 1,
            ..AuthConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = cheap();
        let digest = hasher.hash("pw123").unwrap();
        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.verify("pw123", &digest).unwrap());
        assert!(!hasher.verify("pw124", &digest).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let hasher = cheap();
        assert_ne!(hasher.hash("pw123").unwrap(), hasher.hash("pw123").unwrap());
    }

    #[test]
    fn test_corrupt_digest_is_internal() {
        let err = cheap().verify("pw123", "not-a-phc-string").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }

    #[test]
    fn test_invalid_params_are_configuration_errors() {
        let err = PasswordHasher::new(&AuthConfig {
            argon2_iterations: 0,
            ..AuthConfig::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
