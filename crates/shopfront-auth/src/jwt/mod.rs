//! JWT token encoding, decoding, revocation, and claims management.

pub mod claims;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod revocation;
pub mod service;

pub use claims::{Claims, TokenType};
pub use decoder::JwtDecoder;
pub use encoder::JwtEncoder;
pub use error::{TokenError, TokenFault};
pub use revocation::RevocationLedger;
pub use service::{TokenPair, TokenService};
