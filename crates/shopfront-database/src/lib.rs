//! # shopfront-database
//!
//! The credential store boundary: store traits consumed by the auth core,
//! an in-process [`MemoryStore`], and PostgreSQL repositories backed by sqlx.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::memory::MemoryStore;
pub use store::{PermissionStore, RoleStore, UserStore};
