//! # shopfront-entity
//!
//! Identity entities for Shopfront: users, roles, and permissions. Each
//! struct maps to a table row and derives `sqlx::FromRow`; the owned
//! many-to-many sets (a user's roles, a role's permissions) are hydrated
//! by the store and skipped by the row mapping.

pub mod permission;
pub mod role;
pub mod user;
