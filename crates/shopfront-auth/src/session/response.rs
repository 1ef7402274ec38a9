//! Outbound authentication results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use shopfront_core::types::UserId;
use shopfront_entity::user::User;

use crate::jwt::TokenPair;
use crate::rbac::Principal;

/// Scheme name returned alongside every access token.
pub const BEARER: &str = "Bearer";

/// Token material plus the identity it was issued to.
///
/// Profile fields (`full_name`, `email`, `roles`) are present in the full
/// form and stripped by [`public`](Self::public).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Account the tokens were issued to.
    pub user_id: UserId,
    /// Short-lived access token.
    pub access_token: String,
    /// Always `"Bearer"`.
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in_seconds: i64,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Account username.
    pub username: String,
    /// Full name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Names of held roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<BTreeSet<String>>,
}

impl AuthResponse {
    /// Full response for `user` carrying `tokens`.
    pub fn new(tokens: TokenPair, user: &User) -> Self {
        Self {
            user_id: user.id,
            access_token: tokens.access_token,
            token_type: BEARER.to_string(),
            expires_in_seconds: tokens.expires_in_seconds,
            refresh_token: tokens.refresh_token,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            email: Some(user.email.clone()),
            roles: Some(user.role_names()),
        }
    }

    /// Drops email, full name, and roles.
    pub fn public(self) -> Self {
        Self {
            full_name: None,
            email: None,
            roles: None,
            ..self
        }
    }

    /// Full form for the account owner or a privileged viewer, public
    /// form for anyone else.
    pub fn visible_to(self, viewer: &Principal) -> Self {
        if viewer.is(self.user_id) || viewer.is_privileged() {
            self
        } else {
            self.public()
        }
    }

    /// Whether profile fields have been stripped.
    pub fn is_public(&self) -> bool {
        self.email.is_none() && self.full_name.is_none() && self.roles.is_none()
    }
}
