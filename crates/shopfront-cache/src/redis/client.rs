//! Connection to the Redis server that holds the shared revocation ledger.

use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use shopfront_core::config::cache::RedisCacheConfig;
use shopfront_core::config::mask_url_password;
use shopfront_core::error::{AppError, ErrorKind};
use shopfront_core::result::AppResult;

/// A reconnecting Redis handle scoped to one deployment's key prefix.
///
/// Cloning is cheap; every clone shares the same multiplexed connection.
#[derive(Debug, Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisClient {
    /// Opens the connection. Fails unless the server answers `PING`.
    pub async fn connect(config: &RedisCacheConfig) -> AppResult<Self> {
        let url = mask_url_password(&config.url);
        info!(url = %url, prefix = %config.key_prefix, "Opening revocation ledger connection");

        let client = Client::open(config.url.as_str())
            .map_err(|e| ledger_error(format!("Invalid Redis URL {url}"), e))?;
        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| ledger_error(format!("Redis at {url} is unreachable"), e))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ledger_error(format!("Redis at {url} did not answer PING"), e))?;

        info!("Revocation ledger connection ready");
        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// A handle for issuing commands.
    pub fn conn_mut(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// The stored key for a ledger key.
    pub fn prefixed_key(&self, key: &str) -> String {
        scoped(&self.key_prefix, key)
    }
}

fn scoped(prefix: &str, key: &str) -> String {
    format!("{prefix}{key}")
}

fn ledger_error(message: String, source: redis::RedisError) -> AppError {
    AppError::with_source(ErrorKind::Cache, message, source)
}
