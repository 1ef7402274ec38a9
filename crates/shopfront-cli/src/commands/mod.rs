//! CLI command definitions and dispatch.

pub mod config;
pub mod migrate;
pub mod roles;
pub mod super_admin;
pub mod token;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use shopfront_auth::{AuthContext, Stores};
use shopfront_cache::CacheManager;
use shopfront_core::config::AppConfig;
use shopfront_core::error::AppError;
use shopfront_core::traits::SystemClock;
use shopfront_database::DatabasePool;

use crate::output::OutputFormat;

/// Shopfront: operator tools for the authentication core
#[derive(Debug, Parser)]
#[command(name = "shopfront", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Built-in role seeding and role listing
    Roles(roles::RolesArgs),
    /// Super administrator bootstrap and recovery
    SuperAdmin(super_admin::SuperAdminArgs),
    /// Token inspection
    Token(token::TokenArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &self.config).await,
            Commands::Roles(args) => roles::execute(args, &self.config, self.format).await,
            Commands::SuperAdmin(args) => {
                super_admin::execute(args, &self.config, self.format).await
            }
            Commands::Token(args) => token::execute(args, &self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: connect to the database from config
pub async fn connect_database(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: wire the auth core against PostgreSQL and the configured cache
pub async fn build_context(config: &AppConfig, pool: &DatabasePool) -> Result<AuthContext, AppError> {
    let cache = CacheManager::new(&config.cache).await?;
    AuthContext::new(
        &config.auth,
        Stores::postgres(pool),
        Arc::new(cache),
        Arc::new(SystemClock),
    )
}

/// Helper: read a value from a flag or prompt for it
pub fn prompt_text(value: &Option<String>, prompt: &str) -> Result<String, AppError> {
    match value {
        Some(v) => Ok(v.clone()),
        None => dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(|e| AppError::internal(format!("Input error: {e}"))),
    }
}

/// Helper: read a password from a flag or prompt for it
pub fn prompt_password(
    value: &Option<String>,
    prompt: &str,
    confirm: bool,
) -> Result<String, AppError> {
    if let Some(v) = value {
        return Ok(v.clone());
    }

    let mut input = dialoguer::Password::new().with_prompt(prompt);
    if confirm {
        input = input.with_confirmation("Confirm password", "Passwords do not match");
    }
    input
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}
