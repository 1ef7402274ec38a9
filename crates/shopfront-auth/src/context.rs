//! Assembly of the auth core from configuration and collaborators.

use std::sync::Arc;

use tracing::info;

use shopfront_core::config::AuthConfig;
use shopfront_core::result::AppResult;
use shopfront_core::traits::{CacheProvider, Clock};
use shopfront_database::store::{PermissionStore, RoleStore, UserStore};
use shopfront_database::{DatabasePool, MemoryStore};

use crate::jwt::TokenService;
use crate::password::{PasswordHasher, PasswordValidator};
use crate::rbac::RoleAuthority;
use crate::session::SessionManager;

/// The credential store collaborators.
#[derive(Debug, Clone)]
pub struct Stores {
    /// User records and role assignments.
    pub users: Arc<dyn UserStore>,
    /// Roles and their permission sets.
    pub roles: Arc<dyn RoleStore>,
    /// Permission catalogue.
    pub permissions: Arc<dyn PermissionStore>,
}

impl Stores {
    /// All three stores backed by one in-process store.
    pub fn memory(store: MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            roles: Arc::new(store.clone()),
            permissions: Arc::new(store),
        }
    }

    /// PostgreSQL repositories sharing one pool.
    pub fn postgres(pool: &DatabasePool) -> Self {
        Self {
            users: Arc::new(pool.users()),
            roles: Arc::new(pool.roles()),
            permissions: Arc::new(pool.permissions()),
        }
    }
}

/// The wired auth core: token service, role authority, session manager.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Token issuance and validation.
    pub tokens: Arc<TokenService>,
    /// Role & permission authority.
    pub authority: RoleAuthority,
    /// Credential & session manager.
    pub sessions: SessionManager,
}

impl AuthContext {
    /// Wires every component. Fails fast on a missing signing key or
    /// invalid hashing parameters.
    pub fn new(
        config: &AuthConfig,
        stores: Stores,
        cache: Arc<dyn CacheProvider>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let tokens = Arc::new(TokenService::new(config, cache, clock.clone())?);
        let authority = RoleAuthority::new(
            stores.users.clone(),
            stores.roles,
            stores.permissions,
            clock.clone(),
        );
        let sessions = SessionManager::new(
            stores.users,
            authority.clone(),
            tokens.clone(),
            Arc::new(PasswordHasher::new(config)?),
            PasswordValidator::new(config),
            clock,
        )?;

        info!(
            access_ttl_minutes = config.jwt_access_ttl_minutes,
            refresh_ttl_hours = config.jwt_refresh_ttl_hours,
            key_id = config.jwt_key_id.as_deref().unwrap_or("-"),
            "Auth core initialized"
        );

        Ok(Self {
            tokens,
            authority,
            sessions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_cache::memory::MemoryCacheProvider;
    use shopfront_core::config::cache::MemoryCacheConfig;
    use shopfront_core::error::ErrorKind;
    use shopfront_core::traits::SystemClock;

    #[test]
    fn test_missing_signing_key_fails_fast() {
        let err = AuthContext::new(
            &AuthConfig::default(),
            Stores::memory(MemoryStore::new()),
            Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default())),
            Arc::new(SystemClock),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_invalid_argon2_params_fail_fast() {
        let config = AuthConfig {
            jwt_secret: "test-signing-key-that-is-at-least-32-bytes".to_string(),
            argon2_parallelism: 0,
            ..AuthConfig::default()
        };
        let err = AuthContext::new(
            &config,
            Stores::memory(MemoryStore::new()),
            Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default())),
            Arc::new(SystemClock),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
