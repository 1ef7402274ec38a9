//! Token issuance, validation, and revocation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use shopfront_core::config::AuthConfig;
use shopfront_core::error::AppError;
use shopfront_core::result::AppResult;
use shopfront_core::traits::{CacheProvider, Clock};
use shopfront_entity::user::User;

use super::claims::{Claims, TokenType};
use super::decoder::JwtDecoder;
use super::encoder::JwtEncoder;
use super::error::TokenError;
use super::revocation::RevocationLedger;

/// A freshly minted access + refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
    /// Access token lifetime in seconds.
    pub expires_in_seconds: i64,
}

/// Turns users into signed, time-bounded tokens and back.
///
/// The signing key is fixed at construction. Decoding is read-only apart
/// from the revocation lookup and may run with unbounded parallelism.
#[derive(Debug)]
pub struct TokenService {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    ledger: RevocationLedger,
    clock: Arc<dyn Clock>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Builds the service, failing fast on a missing or weak signing key.
    pub fn new(
        config: &AuthConfig,
        cache: Arc<dyn CacheProvider>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let key = config.signing_key()?;

        Ok(Self {
            encoder: JwtEncoder::new(&key, config.jwt_key_id.clone()),
            decoder: JwtDecoder::new(&key, config.jwt_leeway_seconds),
            ledger: RevocationLedger::new(cache),
            clock,
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
        })
    }

    /// Configured access token lifetime.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Configured refresh token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Signs a token of the given type for `user` that expires after `ttl`.
    pub fn issue(&self, user: &User, typ: TokenType, ttl: Duration) -> AppResult<String> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user.username.clone(),
            uid: user.id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
            ver: user.token_generation,
            typ,
        };
        self.encoder.encode(&claims)
    }

    /// Issues an access + refresh pair with the configured lifetimes.
    pub fn issue_pair(&self, user: &User) -> AppResult<TokenPair> {
        let now = self.clock.now();
        let access_token = self.issue(user, TokenType::Access, self.access_ttl)?;
        let refresh_token = self.issue(user, TokenType::Refresh, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at: now + self.access_ttl,
            refresh_expires_at: now + self.refresh_ttl,
            expires_in_seconds: self.access_ttl.num_seconds(),
        })
    }

    /// Verifies signature, algorithm, claims, and expiry. Does not consult
    /// the revocation ledger.
    pub fn decode(&self, token: &str) -> AppResult<Claims> {
        Ok(self.decoder.decode(token, self.clock.now())?)
    }

    /// Full validation of a token of either type, including revocation.
    pub async fn validate(&self, token: &str) -> AppResult<Claims> {
        let claims = self.decode(token)?;
        self.ledger.check(&claims).await?;
        Ok(claims)
    }

    /// Whether the token passes [`validate`](Self::validate).
    pub async fn is_valid(&self, token: &str) -> bool {
        self.validate(token).await.is_ok()
    }

    /// Returns the subject of a verified, unexpired token.
    pub fn extract_username(&self, token: &str) -> AppResult<String> {
        self.decode(token).map(|claims| claims.sub)
    }

    /// Validates a token that must be an access token.
    pub async fn decode_access(&self, token: &str) -> AppResult<Claims> {
        self.decode_typed(token, TokenType::Access).await
    }

    /// Validates a token that must be a refresh token.
    pub async fn decode_refresh(&self, token: &str) -> AppResult<Claims> {
        self.decode_typed(token, TokenType::Refresh).await
    }

    async fn decode_typed(&self, token: &str, expected: TokenType) -> AppResult<Claims> {
        let claims = self.decode(token)?;
        if claims.typ != expected {
            return Err(TokenError::WrongType.into());
        }
        self.ledger.check(&claims).await?;
        Ok(claims)
    }

    /// Revokes a token before its natural expiry.
    ///
    /// An already expired token needs no ledger entry; a token that does not
    /// verify is rejected.
    pub async fn invalidate(&self, token: &str) -> AppResult<()> {
        let claims = self.decoder.verify(token).map_err(AppError::from)?;
        let now = self.clock.now();
        if claims.is_expired_at(now, 0) {
            return Ok(());
        }
        self.ledger.revoke(&claims, now).await
    }

    /// Revokes an already decoded token, failing with `InvalidToken` if
    /// another caller revoked it first. Only one of any number of concurrent
    /// callers presenting the same token gets through.
    pub async fn consume(&self, claims: &Claims) -> AppResult<()> {
        if !self.ledger.consume(claims, self.clock.now()).await? {
            return Err(TokenError::Revoked.into());
        }
        Ok(())
    }

    /// Publishes the user's current token generation so every token minted
    /// under an earlier one is rejected.
    ///
    /// Call after [`User::revoke_tokens`] has been persisted.
    pub async fn revoke_all_for_user(&self, user: &User) -> AppResult<()> {
        let retain = self
            .refresh_ttl
            .max(self.access_ttl)
            .to_std()
            .unwrap_or_default();
        self.ledger
            .revoke_generations_below(user.id, user.token_generation, retain)
            .await?;
        info!(
            user_id = %user.id,
            generation = user.token_generation,
            "Revoked all earlier tokens for user"
        );
        Ok(())
    }
}
