//! Revocation ledger backend selection.

use serde::{Deserialize, Serialize};

/// Where revoked token ids and per-user token generations are recorded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// `"memory"` keeps the ledger inside this process; `"redis"` shares it
    /// between every server instance.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Settings for the shared backend.
    #[serde(default)]
    pub redis: RedisCacheConfig,
    /// Settings for the in-process backend.
    #[serde(default)]
    pub memory: MemoryCacheConfig,
}

impl CacheConfig {
    /// Whether ledger writes are visible to other processes.
    pub fn is_shared(&self) -> bool {
        self.provider == "redis"
    }
}

/// Shared ledger on a Redis server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Connection URL; a password in it is masked in logs.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Prepended to every ledger key so several deployments can share a server.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

/// In-process ledger.
///
/// Entries are never evicted for space and live exactly as long as the TTL
/// they were written with, so there is no capacity or lifetime cap here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Number of entries to allocate room for up front.
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "shopfront:".to_string()
}

fn default_initial_capacity() -> usize {
    1024
}
