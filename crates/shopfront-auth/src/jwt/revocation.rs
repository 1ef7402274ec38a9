//! Server-side revocation ledger for otherwise stateless tokens.
//!
//! Two kinds of entries live in the cache:
//!
//! - a per-token marker keyed by `jti`, kept only as long as the token itself
//!   could still be accepted;
//! - a per-user generation floor: every token of that user carrying an
//!   older `ver` claim is rejected.
//!
//! The floor mirrors `User::token_generation`, which stays authoritative;
//! the cache copy lets token checks that never load the user see it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use shopfront_cache::keys;
use shopfront_core::error::AppError;
use shopfront_core::traits::CacheProvider;
use shopfront_core::types::UserId;

use super::claims::Claims;
use super::error::TokenError;

/// Shortest lifetime of a ledger entry, so a token that is about to expire
/// cannot slip through while its entry is being written.
const MIN_ENTRY_TTL: Duration = Duration::from_secs(60);

/// Records revoked tokens and per-user token generation floors.
#[derive(Debug, Clone)]
pub struct RevocationLedger {
    cache: Arc<dyn CacheProvider>,
}

impl RevocationLedger {
    /// Creates a ledger over the given cache backend.
    pub fn new(cache: Arc<dyn CacheProvider>) -> Self {
        Self { cache }
    }

    /// Revokes a single token until its natural expiry.
    pub async fn revoke(&self, claims: &Claims, now: DateTime<Utc>) -> Result<(), AppError> {
        self.cache
            .set(&keys::revoked_token(&claims.jti), "1", entry_ttl(claims, now))
            .await?;

        debug!(
            user_id = %claims.uid,
            token_type = %claims.typ,
            "Token revoked"
        );
        Ok(())
    }

    /// Revokes a token unless it is already revoked, in one atomic step.
    ///
    /// Returns `true` for exactly one of any number of concurrent callers
    /// presenting the same token.
    pub async fn consume(&self, claims: &Claims, now: DateTime<Utc>) -> Result<bool, AppError> {
        let claimed = self
            .cache
            .set_if_absent(&keys::revoked_token(&claims.jti), "1", entry_ttl(claims, now))
            .await?;

        if claimed {
            debug!(user_id = %claims.uid, token_type = %claims.typ, "Token consumed");
        }
        Ok(claimed)
    }

    /// Rejects every token of the user whose generation is below `generation`.
    ///
    /// `retain` must cover the longest token lifetime so the floor outlives
    /// every token it applies to.
    pub async fn revoke_generations_below(
        &self,
        user_id: UserId,
        generation: i32,
        retain: Duration,
    ) -> Result<(), AppError> {
        self.cache
            .set(
                &keys::user_token_generation(user_id),
                &generation.to_string(),
                retain.max(MIN_ENTRY_TTL),
            )
            .await?;

        debug!(user_id = %user_id, generation, "Earlier token generations revoked");
        Ok(())
    }

    /// Fails with [`TokenError::Revoked`] if the token appears in the ledger.
    pub async fn check(&self, claims: &Claims) -> Result<(), AppError> {
        if self.cache.exists(&keys::revoked_token(&claims.jti)).await? {
            return Err(TokenError::Revoked.into());
        }

        let key = keys::user_token_generation(claims.uid);
        if let Some(raw) = self.cache.get(&key).await? {
            match raw.parse::<i32>() {
                Ok(floor) if claims.ver < floor => return Err(TokenError::Revoked.into()),
                Ok(_) => {}
                Err(_) => warn!(key = %key, "Ignoring unparseable token generation"),
            }
        }

        Ok(())
    }
}

fn entry_ttl(claims: &Claims, now: DateTime<Utc>) -> Duration {
    claims
        .remaining(now)
        .to_std()
        .unwrap_or(MIN_ENTRY_TTL)
        .max(MIN_ENTRY_TTL)
}
