//! Cache key builders for revocation ledger entries.
//!
//! The Redis provider prepends the configured key prefix on top of these.

use shopfront_core::types::UserId;

/// Namespace shared by every ledger key.
const NAMESPACE: &str = "auth:revoked";

/// Key marking a single token (by `jti`) as revoked.
pub fn revoked_token(jti: &str) -> String {
    format!("{NAMESPACE}:jti:{jti}")
}

/// Key holding a user's current token generation; older generations are revoked.
pub fn user_token_generation(user_id: UserId) -> String {
    format!("{NAMESPACE}:user:{user_id}")
}
