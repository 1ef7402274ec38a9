//! # shopfront-auth
//!
//! The authentication and authorization core for Shopfront.
//!
//! ## Modules
//!
//! - `jwt` — token issuance, validation, classification, and the revocation ledger
//! - `password` — Argon2id password hashing and policy enforcement
//! - `rbac` — capability policies, the authorization gate, and the role authority
//! - `session` — login, registration, password reset, refresh, and logout
//! - `context` — wiring of the above from configuration

pub mod context;
pub mod jwt;
pub mod password;
pub mod rbac;
pub mod session;

pub use context::{AuthContext, Stores};
pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenError, TokenPair, TokenService, TokenType};
pub use password::{CredentialHasher, PasswordHasher, PasswordValidator};
pub use rbac::{Capability, Principal, RbacEnforcer, RbacPolicies, RoleAuthority};
pub use session::{AuthResponse, RegisterRequest, SessionManager};
