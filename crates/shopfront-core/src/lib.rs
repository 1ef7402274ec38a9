//! # shopfront-core
//!
//! Core crate for the Shopfront authentication backend. Contains the
//! configuration schema, typed identifiers, the cache and clock traits,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other Shopfront crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
