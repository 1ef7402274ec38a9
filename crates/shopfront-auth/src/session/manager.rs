//! Session lifecycle manager: login, registration, refresh, and logout flows.

use std::sync::Arc;

use tracing::{info, warn};

use shopfront_core::error::AppError;
use shopfront_core::result::AppResult;
use shopfront_core::traits::Clock;
use shopfront_database::store::UserStore;
use shopfront_entity::role::BuiltinRole;
use shopfront_entity::user::{CreateUser, User};

use crate::jwt::{Claims, TokenService};
use crate::password::{CredentialHasher, PasswordValidator};
use crate::rbac::{Capability, Principal, RoleAuthority};

use super::request::RegisterRequest;
use super::response::AuthResponse;

/// Returned for every credential mismatch, whichever field was wrong.
const BAD_CREDENTIALS: &str = "Invalid username or password";

/// Verified against when the username is unknown so both failure paths
/// pay for one hash verification.
const TIMING_DECOY: &str = "shopfront-timing-decoy";

/// Orchestrates credential checks, role assignment, and token minting.
#[derive(Clone)]
pub struct SessionManager {
    /// Credential store.
    users: Arc<dyn UserStore>,
    /// Role authority and authorization gate.
    authority: RoleAuthority,
    /// Token issuance and validation.
    tokens: Arc<TokenService>,
    /// Password hasher.
    hasher: Arc<dyn CredentialHasher>,
    /// Password policy.
    validator: PasswordValidator,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Digest of [`TIMING_DECOY`].
    decoy_hash: Arc<str>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("tokens", &self.tokens)
            .field("validator", &self.validator)
            .finish()
    }
}

impl SessionManager {
    /// Creates a new session manager with all required dependencies.
    pub fn new(
        users: Arc<dyn UserStore>,
        authority: RoleAuthority,
        tokens: Arc<TokenService>,
        hasher: Arc<dyn CredentialHasher>,
        validator: PasswordValidator,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let decoy_hash = hasher.hash(TIMING_DECOY)?.into();
        Ok(Self {
            users,
            authority,
            tokens,
            hasher,
            validator,
            clock,
            decoy_hash,
        })
    }

    // ── Login ──────────────────────────────────────────────────────

    /// Verifies credentials and mints a fresh token pair.
    ///
    /// Unknown usernames, wrong passwords, and disabled accounts all fail
    /// with the same `AuthenticationFailed` error.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<AuthResponse> {
        let Some(mut user) = self.users.find_by_username(username.trim()).await? else {
            self.verify_password(password, &self.decoy_hash).await?;
            warn!(username = %username, "Login failed: unknown username");
            return Err(AppError::authentication(BAD_CREDENTIALS));
        };

        if !self.verify_password(password, &user.password_hash).await? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::authentication(BAD_CREDENTIALS));
        }

        if !user.enabled {
            warn!(user_id = %user.id, "Login refused: account disabled");
            return Err(AppError::authentication(BAD_CREDENTIALS));
        }

        user.touch(self.clock.now());
        let user = self.users.save(&user).await?;
        let tokens = self.tokens.issue_pair(&user)?;

        info!(user_id = %user.id, username = %user.username, "Login successful");
        Ok(AuthResponse::new(tokens, &user))
    }

    // ── Registration ───────────────────────────────────────────────

    /// Open self-registration with the `USER` role.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        self.create_account(request, BuiltinRole::User).await
    }

    /// Registers an `ADMIN`. The caller must hold `SUPER_ADMIN`.
    pub async fn register_admin(
        &self,
        caller: &Principal,
        request: RegisterRequest,
    ) -> AppResult<AuthResponse> {
        self.authority
            .enforcer()
            .require(caller, Capability::RegisterAdmin)?;
        let response = self.create_account(request, BuiltinRole::Admin).await?;
        info!(created = %response.username, by = %caller.username, "Admin registered");
        Ok(response.visible_to(caller))
    }

    /// Registers a `SUPER_ADMIN`. The caller must hold `SUPER_ADMIN`.
    pub async fn register_super_admin(
        &self,
        caller: &Principal,
        request: RegisterRequest,
    ) -> AppResult<AuthResponse> {
        self.authority
            .enforcer()
            .require(caller, Capability::RegisterSuperAdmin)?;
        let response = self.create_account(request, BuiltinRole::SuperAdmin).await?;
        info!(created = %response.username, by = %caller.username, "Super admin registered");
        Ok(response.visible_to(caller))
    }

    /// Out-of-band creation of the first `SUPER_ADMIN`.
    ///
    /// Not reachable through any caller-facing path; fails with `Conflict`
    /// once a `SUPER_ADMIN` exists.
    pub async fn bootstrap_super_admin(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let role = self.authority.builtin_role(BuiltinRole::SuperAdmin).await?;
        let holders = self.users.count_with_role(role.id).await?;
        if holders > 0 {
            return Err(AppError::conflict(
                "A super administrator already exists; use register_super_admin",
            ));
        }

        let response = self
            .create_account(request, BuiltinRole::SuperAdmin)
            .await?;
        info!(username = %response.username, "Bootstrapped first super admin");
        Ok(response)
    }

    /// Validates, hashes, assigns `role`, and persists the user and its
    /// initial role in one constrained write.
    async fn create_account(
        &self,
        request: RegisterRequest,
        role: BuiltinRole,
    ) -> AppResult<AuthResponse> {
        let request = request.normalized()?;
        self.validator
            .validate(&request.password, &[request.username.as_str(), request.email.as_str()])?;

        let password_hash = self.hash_password(&request.password).await?;
        let mut user = User::from_create(
            CreateUser {
                username: request.username,
                email: request.email,
                password_hash,
                full_name: request.full_name,
                phone: request.phone,
            },
            self.clock.now(),
        );
        self.authority.attach_builtin(&mut user, role).await?;

        // The store's unique indexes decide concurrent registrations.
        let user = self.users.create(&user).await?;
        let tokens = self.tokens.issue_pair(&user)?;

        info!(user_id = %user.id, username = %user.username, role = %role, "User registered");
        Ok(AuthResponse::new(tokens, &user))
    }

    // ── Passwords ──────────────────────────────────────────────────

    /// Sets a new password on a `SUPER_ADMIN` account and revokes its
    /// earlier tokens. The caller must hold `SUPER_ADMIN`.
    pub async fn reset_super_admin_password(
        &self,
        caller: &Principal,
        username: &str,
        new_password: &str,
    ) -> AppResult<()> {
        self.authority
            .enforcer()
            .require(caller, Capability::ResetSuperAdminPassword)?;

        let mut user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))?;

        if !user.has_builtin(BuiltinRole::SuperAdmin) {
            return Err(AppError::invalid_role(format!(
                "User '{}' is not a super administrator",
                user.username
            )));
        }

        self.validator
            .validate(new_password, &[user.username.as_str(), user.email.as_str()])?;
        user.password_hash = self.hash_password(new_password).await?;
        user.revoke_tokens(self.clock.now());
        let user = self.users.save(&user).await?;
        self.tokens.revoke_all_for_user(&user).await?;

        info!(user_id = %user.id, by = %caller.username, "Super admin password reset");
        Ok(())
    }

    /// Changes the caller's own password and revokes their earlier tokens.
    pub async fn change_password(
        &self,
        caller: &Principal,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let mut user = self
            .users
            .find_by_id(caller.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", caller.user_id)))?;

        if !self
            .verify_password(current_password, &user.password_hash)
            .await?
        {
            warn!(user_id = %user.id, "Password change refused: wrong current password");
            return Err(AppError::authentication(BAD_CREDENTIALS));
        }

        self.validator
            .validate_not_same(current_password, new_password)?;
        self.validator
            .validate(new_password, &[user.username.as_str(), user.email.as_str()])?;

        user.password_hash = self.hash_password(new_password).await?;
        user.revoke_tokens(self.clock.now());
        let user = self.users.save(&user).await?;
        self.tokens.revoke_all_for_user(&user).await?;

        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    // ── Tokens ─────────────────────────────────────────────────────

    /// Exchanges a refresh token for a brand-new pair.
    ///
    /// The presented refresh token is consumed atomically, so of several
    /// requests racing with the same token only one receives a pair.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.tokens.decode_refresh(refresh_token).await?;
        let user = self.active_user(&claims).await?;

        self.tokens.consume(&claims).await?;
        let tokens = self.tokens.issue_pair(&user)?;

        info!(user_id = %user.id, "Tokens refreshed");
        Ok(AuthResponse::new(tokens, &user))
    }

    /// Revokes the presented token before its natural expiry.
    pub async fn logout(&self, access_token: &str) -> AppResult<()> {
        self.tokens.invalidate(access_token).await?;
        info!("Token revoked on logout");
        Ok(())
    }

    /// Revokes every token issued to the caller so far.
    pub async fn logout_everywhere(&self, caller: &Principal) -> AppResult<()> {
        let mut user = self
            .users
            .find_by_id(caller.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", caller.user_id)))?;

        user.revoke_tokens(self.clock.now());
        let user = self.users.save(&user).await?;
        self.tokens.revoke_all_for_user(&user).await?;

        info!(user_id = %user.id, "Logged out everywhere");
        Ok(())
    }

    /// Resolves the caller behind an access token from the user's current
    /// stored roles.
    pub async fn resolve_principal(&self, access_token: &str) -> AppResult<Principal> {
        let claims = self.tokens.decode_access(access_token).await?;
        let user = self.active_user(&claims).await?;
        self.authority.principal_for(&user).await
    }

    async fn active_user(&self, claims: &Claims) -> AppResult<User> {
        let user = self
            .users
            .find_by_id(claims.user_id())
            .await?
            .ok_or_else(|| AppError::invalid_token("Token subject no longer exists"))?;

        if !user.enabled {
            return Err(AppError::invalid_token("Token subject is disabled"));
        }
        // The stored generation holds even when the ledger lives in another
        // process's memory.
        if claims.ver != user.token_generation {
            return Err(AppError::invalid_token(
                "Token predates the account's last credential change",
            ));
        }
        Ok(user)
    }

    // ── Hashing ────────────────────────────────────────────────────

    async fn hash_password(&self, password: &str) -> AppResult<String> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
    }

    async fn verify_password(&self, password: &str, digest: &str) -> AppResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
    }
}
