//! Shared test helpers for integration tests.

use std::sync::Arc;

use chrono::Duration;

use shopfront_auth::{AuthContext, AuthResponse, Principal, RegisterRequest, Stores};
use shopfront_cache::memory::MemoryCacheProvider;
use shopfront_core::config::AppConfig;
use shopfront_core::config::cache::MemoryCacheConfig;
use shopfront_core::traits::ManualClock;
use shopfront_database::MemoryStore;

/// Test application context
pub struct TestApp {
    /// The wired auth core
    pub auth: AuthContext,
    /// Backing store for direct inspection
    pub store: MemoryStore,
    /// Clock shared by every component
    pub clock: ManualClock,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a new test application with built-in roles seeded
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-signing-key-of-sufficient-length".to_string();
        config.auth.jwt_key_id = Some("test-key".to_string());
        config.auth.argon2_memory_kib = 8;
        config.auth.argon2_iterations = 1;
        config.auth.argon2_parallelism = 1;

        let store = MemoryStore::new();
        let clock = ManualClock::starting_now();
        let cache = Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default()));

        let auth = AuthContext::new(
            &config.auth,
            Stores::memory(store.clone()),
            cache,
            Arc::new(clock.clone()),
        )
        .expect("Failed to build auth context");

        auth.authority
            .bootstrap_roles()
            .await
            .expect("Failed to bootstrap roles");

        Self {
            auth,
            store,
            clock,
            config,
        }
    }

    /// Register a plain user through the open path
    pub async fn register(&self, username: &str, password: &str) -> AuthResponse {
        self.auth
            .sessions
            .register(RegisterRequest::new(
                username,
                format!("{username}@example.com"),
                password,
            ))
            .await
            .expect("Failed to register user")
    }

    /// Create the first super admin and resolve it as a caller
    pub async fn super_admin(&self) -> Principal {
        let response = self
            .auth
            .sessions
            .bootstrap_super_admin(RegisterRequest::new(
                "root",
                "root@example.com",
                "root-password",
            ))
            .await
            .expect("Failed to bootstrap super admin");
        self.principal(&response).await
    }

    /// Resolve the caller behind a response's access token
    pub async fn principal(&self, response: &AuthResponse) -> Principal {
        self.auth
            .sessions
            .resolve_principal(&response.access_token)
            .await
            .expect("Failed to resolve principal")
    }

    /// Move the shared clock forward
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}
