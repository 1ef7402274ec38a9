//! Credential and session flows: login, registration at each privilege
//! tier, password reset, refresh, and logout.

pub mod manager;
pub mod request;
pub mod response;

pub use manager::SessionManager;
pub use request::RegisterRequest;
pub use response::AuthResponse;
