//! SLH Shop CLI - Database migrations and order operations.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! slh-cli migrate
//!
//! # Mark an order as paid after checking its proof
//! slh-cli orders approve 6f1c9a3e-4b2d-4e8f-9a7c-1d2e3f4a5b6c
//!
//! # Expire pending orders older than the configured TTL
//! slh-cli orders expire
//! slh-cli orders expire --ttl-minutes 60
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `orders approve` - Mark an order paid
//! - `orders expire` - Expire stale pending orders

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use slh_shop_core::OrderId;

mod commands;

#[derive(Parser)]
#[command(name = "slh-cli")]
#[command(author, version, about = "SLH Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Operate on orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Mark an order as paid
    Approve {
        /// Order ID
        id: OrderId,
    },
    /// Expire pending orders that were never paid
    Expire {
        /// Age in minutes after which a pending order expires
        /// (default: `ORDER_TTL_MINUTES`, or 1440)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        ttl_minutes: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Orders { action } => match action {
            OrderAction::Approve { id } => commands::orders::approve(id).await?,
            OrderAction::Expire { ttl_minutes } => {
                commands::orders::expire(ttl_minutes).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_approve() {
        let cli = Cli::try_parse_from([
            "slh-cli",
            "orders",
            "approve",
            "6f1c9a3e-4b2d-4e8f-9a7c-1d2e3f4a5b6c",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Orders {
                action: OrderAction::Approve { .. }
            })
        ));
        assert!(Cli::try_parse_from(["slh-cli", "orders", "approve", "not-a-uuid"]).is_err());
    }

    #[test]
    fn test_parse_expire() {
        let cli = Cli::try_parse_from(["slh-cli", "orders", "expire", "--ttl-minutes", "60"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Orders {
                action: OrderAction::Expire {
                    ttl_minutes: Some(60)
                }
            })
        ));
        assert!(Cli::try_parse_from(["slh-cli", "orders", "expire", "--ttl-minutes", "0"]).is_err());
    }
}
