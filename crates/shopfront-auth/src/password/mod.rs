//! Password hashing and policy enforcement.

pub mod hasher;
pub mod validator;

pub use hasher::{CredentialHasher, PasswordHasher};
pub use validator::PasswordValidator;
