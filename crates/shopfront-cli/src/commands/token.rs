//! Token inspection commands.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::output::{self, OutputFormat};
use shopfront_auth::jwt::TokenFault;
use shopfront_auth::{JwtDecoder, TokenService};
use shopfront_cache::CacheManager;
use shopfront_core::error::AppError;
use shopfront_core::traits::SystemClock;

/// Arguments for token commands
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Token subcommand
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands
#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Verify a token and show its claims
    Inspect {
        /// The compact token string
        token: String,
    },
}

/// Result of inspecting one token
#[derive(Debug, Serialize)]
struct TokenReport {
    /// `valid`, or the reason the token is rejected
    status: String,
    /// Error kind for rejected tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<String>,
    /// Subject username, when the signature verifies
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    /// Subject user id
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    /// Token generation the token was issued under
    #[serde(skip_serializing_if = "Option::is_none")]
    generation: Option<i32>,
    /// `access` or `refresh`
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    /// Issue instant
    #[serde(skip_serializing_if = "Option::is_none")]
    issued_at: Option<DateTime<Utc>>,
    /// Expiry instant
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

/// Execute token commands
pub async fn execute(
    args: &TokenArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let cache = Arc::new(CacheManager::new(&config.cache).await?);
    let service = TokenService::new(&config.auth, cache, Arc::new(SystemClock))?;
    let decoder = JwtDecoder::new(&config.auth.signing_key()?, config.auth.jwt_leeway_seconds);

    match &args.command {
        TokenCommand::Inspect { token } => {
            let (status, error_kind) = match service.validate(token).await {
                Ok(_) => ("valid".to_string(), None),
                Err(e) => {
                    let status = match e.token_fault() {
                        Some(fault) => fault.to_string(),
                        None => e.message.clone(),
                    };
                    (status, Some(e.kind.to_string()))
                }
            };

            let claims = decoder.verify(token).ok();
            let report = TokenReport {
                status,
                error_kind,
                subject: claims.as_ref().map(|c| c.sub.clone()),
                user_id: claims.as_ref().map(|c| c.uid.to_string()),
                generation: claims.as_ref().map(|c| c.ver),
                token_type: claims.as_ref().map(|c| c.typ.to_string()),
                issued_at: claims.as_ref().map(|c| c.issued_at()),
                expires_at: claims.as_ref().map(|c| c.expires_at()),
            };

            match format {
                OutputFormat::Json => output::print_item(&report, format),
                OutputFormat::Table => {
                    output::print_kv("Status", &report.status);
                    if let Some(kind) = &report.error_kind {
                        output::print_kv("Error kind", kind);
                    }
                    if let Some(subject) = &report.subject {
                        output::print_kv("Subject", subject);
                    }
                    if let Some(user_id) = &report.user_id {
                        output::print_kv("User ID", user_id);
                    }
                    if let Some(generation) = report.generation {
                        output::print_kv("Generation", &generation.to_string());
                    }
                    if let Some(token_type) = &report.token_type {
                        output::print_kv("Type", token_type);
                    }
                    if let Some(issued_at) = report.issued_at {
                        output::print_kv("Issued at", &issued_at.to_rfc3339());
                    }
                    if let Some(expires_at) = report.expires_at {
                        output::print_kv("Expires at", &expires_at.to_rfc3339());
                    }
                }
            }
        }
    }

    Ok(())
}
