//! JWT token creation.

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

use shopfront_core::error::{AppError, ErrorKind};

use super::claims::Claims;

/// Signs claim sets with the process-wide HMAC key.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Header written on every token (`alg`, optional `kid`).
    header: Header,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("alg", &self.header.alg)
            .field("kid", &self.header.kid)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates an encoder over the decoded signing key.
    pub fn new(signing_key: &[u8], key_id: Option<String>) -> Self {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = key_id;

        Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            header,
        }
    }

    /// Signs the claims into a compact token.
    pub fn encode(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&self.header, claims, &self.encoding_key).map_err(|e| {
            AppError::with_source(
                ErrorKind::Internal,
                format!("Failed to encode {} token", claims.typ),
                e,
            )
        })
    }
}
