//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use shopfront_auth::PasswordHasher;
use shopfront_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration with secrets masked
    Show,
    /// Validate configuration: signing key, hashing parameters, cache provider
    Validate,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;

    match &args.command {
        ConfigCommand::Show => {
            output::print_item(&config.redacted(), format);
        }
        ConfigCommand::Validate => {
            let checks = config
                .auth
                .signing_key()
                .and_then(|_| PasswordHasher::new(&config.auth))
                .and_then(|_| match config.cache.provider.as_str() {
                    "memory" | "redis" => Ok(()),
                    other => Err(AppError::configuration(format!(
                        "Unknown cache provider: '{other}'"
                    ))),
                });

            match checks {
                Ok(()) => {
                    let shown = config.redacted();
                    output::print_success(&format!("Configuration '{config_path}' is valid"));
                    output::print_kv("Database", &shown.database.url);
                    output::print_kv("Cache", &shown.cache.provider);
                    output::print_kv(
                        "Access TTL",
                        &format!("{} min", config.auth.jwt_access_ttl_minutes),
                    );
                    output::print_kv(
                        "Refresh TTL",
                        &format!("{} h", config.auth.jwt_refresh_ttl_hours),
                    );
                    if config.cache.provider == "memory" {
                        output::print_warning(
                            "In-memory revocation ledger is per-process; use redis with several instances",
                        );
                    }
                }
                Err(e) => {
                    output::print_error(&format!("Configuration invalid: {e}"));
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
