//! Super administrator bootstrap and recovery commands.
//!
//! `create` is the only path that can produce the first SUPER_ADMIN; it is
//! refused once one exists.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use shopfront_auth::RegisterRequest;
use shopfront_core::error::AppError;

/// Arguments for super-admin commands
#[derive(Debug, Args)]
pub struct SuperAdminArgs {
    /// Super-admin subcommand
    #[command(subcommand)]
    pub command: SuperAdminCommand,
}

/// Super-admin subcommands
#[derive(Debug, Subcommand)]
pub enum SuperAdminCommand {
    /// Create the first super administrator
    Create {
        /// Username
        #[arg(short, long)]
        username: Option<String>,
        /// Email
        #[arg(short, long)]
        email: Option<String>,
        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
        /// Full name
        #[arg(long)]
        full_name: Option<String>,
    },
    /// Reset another super administrator's password
    ResetPassword {
        /// Username of the super administrator performing the reset
        #[arg(long = "as")]
        operator: String,
        /// Username of the super administrator to reset
        #[arg(short, long)]
        username: String,
        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

/// Execute super-admin commands
pub async fn execute(
    args: &SuperAdminArgs,
    config_path: &str,
    _format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let pool = super::connect_database(&config).await?;
    let context = super::build_context(&config, &pool).await?;
    context.authority.bootstrap_roles().await?;

    match &args.command {
        SuperAdminCommand::Create {
            username,
            email,
            password,
            full_name,
        } => {
            let username = super::prompt_text(username, "Super admin username")?;
            let email = super::prompt_text(email, "Super admin email")?;
            let password = super::prompt_password(password, "Super admin password", true)?;

            let mut request = RegisterRequest::new(username, email, password);
            request.full_name = full_name.clone();

            let response = context.sessions.bootstrap_super_admin(request).await?;
            output::print_success(&format!(
                "Super admin '{}' created (id: {})",
                response.username, response.user_id
            ));
            if let Some(roles) = &response.roles {
                output::print_kv("Roles", &roles.iter().cloned().collect::<Vec<_>>().join(", "));
            }
        }
        SuperAdminCommand::ResetPassword {
            operator,
            username,
            password,
        } => {
            let operator_password = super::prompt_password(
                &None,
                &format!("Password for '{operator}'"),
                false,
            )?;
            let login = context
                .sessions
                .authenticate(operator, &operator_password)
                .await?;
            let caller = context
                .sessions
                .resolve_principal(&login.access_token)
                .await?;

            let new_password = super::prompt_password(password, "New password", true)?;
            let result = context
                .sessions
                .reset_super_admin_password(&caller, username, &new_password)
                .await;
            context.sessions.logout(&login.access_token).await?;
            result?;

            output::print_success(&format!(
                "Password for '{username}' reset; earlier tokens revoked"
            ));
            if !config.cache.is_shared() {
                output::print_warning(
                    "Cache is process-local; running servers reject the old tokens on their next database lookup",
                );
            }
        }
    }

    pool.close().await;
    Ok(())
}
