//! Built-in role seeding and role listing commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use shopfront_auth::{RoleAuthority, Stores};
use shopfront_core::error::AppError;
use shopfront_core::traits::SystemClock;
use shopfront_database::store::RoleStore;

/// Arguments for role commands
#[derive(Debug, Args)]
pub struct RolesArgs {
    /// Role subcommand
    #[command(subcommand)]
    pub command: RolesCommand,
}

/// Role subcommands
#[derive(Debug, Subcommand)]
pub enum RolesCommand {
    /// Ensure USER, ADMIN and SUPER_ADMIN exist
    Bootstrap,
    /// List all roles with their permissions
    List,
}

/// Role display row
#[derive(Debug, Serialize, Tabled)]
struct RoleRow {
    /// Role ID
    id: String,
    /// Name
    name: String,
    /// Built-in
    builtin: bool,
    /// Description
    description: String,
    /// Permissions
    permissions: String,
}

/// Execute role commands
pub async fn execute(
    args: &RolesArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let pool = super::connect_database(&config).await?;
    let stores = Stores::postgres(&pool);

    match &args.command {
        RolesCommand::Bootstrap => {
            let authority = RoleAuthority::new(
                stores.users,
                stores.roles,
                stores.permissions,
                Arc::new(SystemClock),
            );
            let created = authority.bootstrap_roles().await?;
            if created == 0 {
                output::print_success("Built-in roles already present.");
            } else {
                output::print_success(&format!("Seeded {created} built-in role(s)."));
            }
        }
        RolesCommand::List => {
            let rows: Vec<RoleRow> = stores
                .roles
                .list()
                .await?
                .into_iter()
                .map(|role| RoleRow {
                    id: role.id.to_string(),
                    builtin: role.is_builtin(),
                    name: role.name.to_string(),
                    description: role.description.clone().unwrap_or_default(),
                    permissions: role
                        .permission_names()
                        .into_iter()
                        .collect::<Vec<_>>()
                        .join(", "),
                })
                .collect();
            output::print_list(&rows, format);
        }
    }

    pool.close().await;
    Ok(())
}
