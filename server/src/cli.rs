//! Command-line entry points: the server itself plus a few admin chores.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::routes::create_routes;
use crate::services::permissions;
use crate::state::AppState;
use crate::store::{self, Store};
use crate::utils::error::AppError;

#[derive(Debug, Parser)]
#[command(name = "carmeet-server", version, about = "Car-meet club API server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Apply migrations and serve the API (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Give a member every capability
    GrantAdmin { username: String },
    /// Print a member's role and capability flags
    ShowPermissions { username: String },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    App(#[from] AppError),
}

pub async fn run(cli: Cli, config: Config) -> Result<(), CliError> {
    let store = store::connect(&config).await?;
    tracing::info!("Connected to database at {}", config.redacted_database_url());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            migrate(store.as_ref()).await?;
            serve(store, config).await
        }
        Command::Migrate => migrate(store.as_ref()).await,
        Command::GrantAdmin { username } => {
            let member = permissions::grant_admin(store.as_ref(), &username).await?;
            println!("{} is now an admin", member.username);
            Ok(())
        }
        Command::ShowPermissions { username } => {
            let member = store
                .member_by_username(&username)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("No member named '{username}'")))?;
            let caps = permissions::capabilities_for(store.as_ref(), member.id).await;
            println!("{} ({})", member.username, caps.role());
            println!("  can_edit_members:    {}", caps.can_edit_members);
            println!("  can_post_events:     {}", caps.can_post_events);
            println!("  can_manage_vehicles: {}", caps.can_manage_vehicles);
            Ok(())
        }
    }
}

async fn migrate(store: &dyn Store) -> Result<(), CliError> {
    store.migrate().await?;
    tracing::info!("Migrations run successfully");
    Ok(())
}

async fn serve(store: Arc<dyn Store>, config: Config) -> Result<(), CliError> {
    let addr = config.bind_addr;
    let state = AppState::new(store, config);
    state.spawn_sweepers();

    let app = create_routes(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("🚀 Server running at http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_is_the_default() {
        let cli = Cli::try_parse_from(["carmeet-server"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_admin_subcommands_take_a_username() {
        let cli = Cli::try_parse_from(["carmeet-server", "grant-admin", "kit"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::GrantAdmin {
                username: "kit".to_string()
            })
        );
        assert!(Cli::try_parse_from(["carmeet-server", "show-permissions"]).is_err());
    }
}
