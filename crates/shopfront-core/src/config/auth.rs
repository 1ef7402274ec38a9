//! Authentication configuration.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Minimum accepted signing key length in bytes (HMAC-SHA256 block input).
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

/// Authentication and credential configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default)]
    pub jwt_secret: String,
    /// Whether `jwt_secret` is base64 encoded.
    #[serde(default)]
    pub jwt_secret_base64: bool,
    /// Optional key identifier written to the token header (`kid`).
    #[serde(default)]
    pub jwt_key_id: Option<String>,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub jwt_refresh_ttl_hours: u64,
    /// Clock skew tolerance applied to `exp`, in seconds.
    #[serde(default)]
    pub jwt_leeway_seconds: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Maximum password length.
    #[serde(default = "default_password_max")]
    pub password_max_length: usize,
    /// Minimum zxcvbn score (0-4). Zero disables the entropy check.
    #[serde(default)]
    pub password_min_strength: u8,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_argon2_memory")]
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count.
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    /// Argon2 lanes.
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

impl AuthConfig {
    /// Decode and validate the signing key.
    ///
    /// Called once at startup; the returned bytes are the only key the
    /// process ever signs or verifies with.
    pub fn signing_key(&self) -> Result<Vec<u8>, AppError> {
        if self.jwt_secret.is_empty() {
            return Err(AppError::configuration("auth.jwt_secret is not set"));
        }

        let key = if self.jwt_secret_base64 {
            STANDARD.decode(self.jwt_secret.trim()).map_err(|e| {
                AppError::configuration(format!("auth.jwt_secret is not valid base64: {e}"))
            })?
        } else {
            self.jwt_secret.as_bytes().to_vec()
        };

        if key.len() < MIN_SIGNING_KEY_BYTES {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be at least {MIN_SIGNING_KEY_BYTES} bytes, got {}",
                key.len()
            )));
        }

        Ok(key)
    }

    /// Access token lifetime.
    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.jwt_access_ttl_minutes as i64)
    }

    /// Refresh token lifetime.
    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt_refresh_ttl_hours as i64)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_secret_base64: false,
            jwt_key_id: None,
            jwt_access_ttl_minutes: default_access_ttl(),
            jwt_refresh_ttl_hours: default_refresh_ttl(),
            jwt_leeway_seconds: 0,
            password_min_length: default_password_min(),
            password_max_length: default_password_max(),
            password_min_strength: 0,
            argon2_memory_kib: default_argon2_memory(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"****")
            .field("jwt_secret_base64", &self.jwt_secret_base64)
            .field("jwt_key_id", &self.jwt_key_id)
            .field("jwt_access_ttl_minutes", &self.jwt_access_ttl_minutes)
            .field("jwt_refresh_ttl_hours", &self.jwt_refresh_ttl_hours)
            .field("jwt_leeway_seconds", &self.jwt_leeway_seconds)
            .field("password_min_length", &self.password_min_length)
            .field("password_max_length", &self.password_max_length)
            .field("password_min_strength", &self.password_min_strength)
            .field("argon2_memory_kib", &self.argon2_memory_kib)
            .field("argon2_iterations", &self.argon2_iterations)
            .field("argon2_parallelism", &self.argon2_parallelism)
            .finish()
    }
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    168
}

fn default_password_min() -> usize {
    5
}

fn default_password_max() -> usize {
    128
}

// OWASP minimum for Argon2id: m=19 MiB, t=2, p=1.
fn default_argon2_memory() -> u32 {
    19 * 1024
}

fn default_argon2_iterations() -> u32 {
    2
}

fn default_argon2_parallelism() -> u32 {
    1
}
