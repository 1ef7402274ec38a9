//! Core type definitions used across the Shopfront workspace.

pub mod id;

pub use id::*;
