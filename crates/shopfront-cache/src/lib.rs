//! # shopfront-cache
//!
//! Key/value backends for the token revocation ledger:
//!
//! - **memory**: in-process cache using [moka](https://crates.io/crates/moka),
//!   suitable for a single instance
//! - **redis**: shared cache using the [redis](https://crates.io/crates/redis)
//!   crate, required when several instances must agree on revocations
//!
//! The provider is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::CacheManager;
