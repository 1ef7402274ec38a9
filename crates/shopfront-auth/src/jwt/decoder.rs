//! JWT token verification and failure classification.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use super::claims::Claims;
use super::error::TokenError;

/// Verifies signatures and claim structure; expiry is checked against the caller's clock.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
    /// Clock skew tolerance applied to `exp`, in seconds.
    leeway_seconds: i64,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a decoder over the decoded signing key.
    pub fn new(signing_key: &[u8], leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against the injected clock in `decode`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(signing_key),
            validation,
            leeway_seconds: i64::try_from(leeway_seconds).unwrap_or(i64::MAX),
        }
    }

    /// Verifies signature, algorithm, and claim structure, ignoring expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::EmptyClaims);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| classify(e.kind()))
    }

    /// Verifies the token and rejects it if it is expired at `now`.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.is_expired_at(now, self.leeway_seconds) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

fn classify(kind: &JwtErrorKind) -> TokenError {
    match kind {
        JwtErrorKind::ExpiredSignature => TokenError::Expired,
        JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
        JwtErrorKind::InvalidAlgorithm
        | JwtErrorKind::InvalidAlgorithmName
        | JwtErrorKind::MissingAlgorithm => TokenError::UnsupportedAlgorithm,
        JwtErrorKind::MissingRequiredClaim(_) => TokenError::EmptyClaims,
        _ => TokenError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::claims::TokenType;
    use crate::jwt::encoder::JwtEncoder;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use shopfront_core::types::UserId;

    const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";
    const OTHER_KEY: &[u8] = b"fedcba9876543210fedcba9876543210";

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn claims(ttl: i64) -> Claims {
        Claims {
            sub: "alice".to_string(),
            uid: UserId::new(),
            iat: now().timestamp(),
            exp: now().timestamp() + ttl,
            jti: "jti-1".to_string(),
            ver: 0,
            typ: TokenType::Access,
        }
    }

    fn token(ttl: i64) -> String {
        JwtEncoder::new(KEY, None).encode(&claims(ttl)).unwrap()
    }

    #[test]
    fn test_valid_token_round_trips() {
        let decoder = JwtDecoder::new(KEY, 0);
        let decoded = decoder.decode(&token(60), now()).unwrap();
        assert_eq!(decoded.sub, "alice");
        assert_eq!(decoded.typ, TokenType::Access);
    }

    #[test]
    fn test_zero_ttl_is_expired() {
        let decoder = JwtDecoder::new(KEY, 0);
        assert_eq!(decoder.decode(&token(0), now()), Err(TokenError::Expired));
        assert!(decoder.verify(&token(0)).is_ok());
    }

    #[test]
    fn test_leeway_extends_acceptance() {
        let decoder = JwtDecoder::new(KEY, 30);
        assert!(decoder.decode(&token(0), now()).is_ok());
    }

    #[test]
    fn test_wrong_key_is_invalid_signature() {
        let decoder = JwtDecoder::new(OTHER_KEY, 0);
        assert_eq!(
            decoder.decode(&token(60), now()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_signature_is_invalid_signature() {
        let raw = token(60);
        let (signed, signature) = raw.rsplit_once('.').unwrap();
        let first = if signature.starts_with('A') { 'B' } else { 'A' };
        let raw = format!("{signed}.{first}{}", &signature[1..]);
        let decoder = JwtDecoder::new(KEY, 0);
        assert_eq!(decoder.decode(&raw, now()), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let decoder = JwtDecoder::new(KEY, 0);
        assert_eq!(decoder.decode("not-a-token", now()), Err(TokenError::Malformed));
        assert_eq!(decoder.decode("a.b.c", now()), Err(TokenError::Malformed));
    }

    #[test]
    fn test_empty_input_is_empty_claims() {
        let decoder = JwtDecoder::new(KEY, 0);
        assert_eq!(decoder.decode("  ", now()), Err(TokenError::EmptyClaims));
    }

    #[test]
    fn test_empty_claim_set_is_empty_claims() {
        let raw = encode(
            &Header::default(),
            &serde_json::json!({}),
            &EncodingKey::from_secret(KEY),
        )
        .unwrap();
        let decoder = JwtDecoder::new(KEY, 0);
        assert_eq!(decoder.decode(&raw, now()), Err(TokenError::EmptyClaims));
    }

    #[test]
    fn test_other_algorithm_is_unsupported() {
        let raw = encode(
            &Header::new(Algorithm::HS384),
            &claims(60),
            &EncodingKey::from_secret(KEY),
        )
        .unwrap();
        let decoder = JwtDecoder::new(KEY, 0);
        assert_eq!(
            decoder.decode(&raw, now()),
            Err(TokenError::UnsupportedAlgorithm)
        );
    }

    #[test]
    fn test_key_id_is_written_to_header() {
        let raw = JwtEncoder::new(KEY, Some("k1".to_string()))
            .encode(&claims(60))
            .unwrap();
        let header = jsonwebtoken::decode_header(&raw).unwrap();
        assert_eq!(header.kid.as_deref(), Some("k1"));
        assert_eq!(header.alg, Algorithm::HS256);
    }
}
