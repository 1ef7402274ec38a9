//! JWT claims structure used in access and refresh tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use shopfront_core::types::UserId;

/// Claims payload embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,
    /// The user's id.
    pub uid: UserId,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token id, the revocation ledger key.
    pub jti: String,
    /// The user's token generation when the token was issued.
    pub ver: i32,
    /// Token type.
    pub typ: TokenType,
}

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived token presented on each request.
    Access,
    /// Long-lived token exchanged for a new pair.
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

impl Claims {
    /// Returns the user ID.
    pub fn user_id(&self) -> UserId {
        self.uid
    }

    /// Returns the username the token was issued to.
    pub fn username(&self) -> &str {
        &self.sub
    }

    /// Returns the issue time.
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Returns the expiration time.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether the token is expired at `now`, allowing `leeway` seconds of skew.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway_seconds: i64) -> bool {
        now.timestamp() >= self.exp.saturating_add(leeway_seconds)
    }

    /// Time left before expiry at `now` (zero if already expired).
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at() - now).max(Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(iat: i64, exp: i64) -> Claims {
        Claims {
            sub: "alice".to_string(),
            uid: UserId::new(),
            iat,
            exp,
            jti: "jti-1".to_string(),
            ver: 0,
            typ: TokenType::Access,
        }
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let c = claims(1_000, 1_900);
        let at = |s| DateTime::from_timestamp(s, 0).unwrap();
        assert!(!c.is_expired_at(at(1_899), 0));
        assert!(c.is_expired_at(at(1_900), 0));
        assert!(!c.is_expired_at(at(1_900), 5));
    }

    #[test]
    fn test_zero_ttl_is_already_expired() {
        let c = claims(1_000, 1_000);
        assert!(c.is_expired_at(c.issued_at(), 0));
        assert_eq!(c.remaining(c.issued_at()), Duration::zero());
    }

    #[test]
    fn test_token_type_wire_names() {
        assert_eq!(serde_json::to_string(&TokenType::Refresh).unwrap(), "\"refresh\"");
        assert_eq!(TokenType::Access.to_string(), "access");
    }
}
