//! Classification of token failures.

use thiserror::Error;

use shopfront_core::error::{AppError, ErrorKind};

/// Why a token was not trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature and structure are fine but the token is past its expiry.
    #[error("token has expired")]
    Expired,
    /// The token is not a well-formed compact JWS or its claims do not parse.
    #[error("token is malformed")]
    Malformed,
    /// The MAC does not verify under the signing key.
    #[error("token signature is invalid")]
    InvalidSignature,
    /// The header names an algorithm other than HS256.
    #[error("token algorithm is not supported")]
    UnsupportedAlgorithm,
    /// The claim set is empty or lacks a required claim.
    #[error("token claims are empty")]
    EmptyClaims,
    /// An access token was presented where a refresh token was expected, or vice versa.
    #[error("token has the wrong type")]
    WrongType,
    /// The token was revoked before its natural expiry.
    #[error("token has been revoked")]
    Revoked,
}

impl TokenError {
    /// The application error kind this failure surfaces as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Expired => ErrorKind::TokenExpired,
            _ => ErrorKind::InvalidToken,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        let message = match err {
            TokenError::Expired => "Token has expired",
            TokenError::Malformed => "Invalid token format",
            TokenError::InvalidSignature => "Invalid token signature",
            TokenError::UnsupportedAlgorithm => "Unsupported token algorithm",
            TokenError::EmptyClaims => "Token claims are empty",
            TokenError::WrongType => "Invalid token type",
            TokenError::Revoked => "Token has been revoked",
        };
        AppError::with_source(err.kind(), message, err)
    }
}

/// Access to the precise token failure behind an [`AppError`].
pub trait TokenFault {
    /// Returns the token failure that caused this error, if any.
    fn token_fault(&self) -> Option<TokenError>;
}

impl TokenFault for AppError {
    fn token_fault(&self) -> Option<TokenError> {
        self.source_as::<TokenError>().copied()
    }
}
