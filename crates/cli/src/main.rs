//! Osun CLI - operator tools for the storefront API.
//!
//! # Usage
//!
//! ```bash
//! # Generate five return codes
//! osun-cli return-code --count 5
//!
//! # Show the decoded returns/refund metadata of an order
//! osun-cli order inspect 500
//!
//! # Pull the latest JLO return status into an order
//! osun-cli order sync 500
//!
//! # Show which upstreams are configured (secrets redacted)
//! osun-cli config check
//! ```
//!
//! Configuration is read from the environment (and `.env`) the same way the
//! server reads it.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use osun_core::OrderId;

mod commands;

#[derive(Parser)]
#[command(name = "osun-cli")]
#[command(author, version, about = "Osun storefront operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate return codes
    ReturnCode {
        /// How many codes to print
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },
    /// Inspect or reconcile an order
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Configuration checks
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Print the order's decoded return, refund and shipment metadata
    Inspect {
        /// WooCommerce order id
        id: OrderId,
    },
    /// Sync the order's return status from JLO once
    Sync {
        /// WooCommerce order id
        id: OrderId,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load the configuration and report which upstreams are configured
    Check,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::ReturnCode { count } => commands::return_code::generate(count),
        Commands::Order { action } => match action {
            OrderAction::Inspect { id } => commands::order::inspect(id).await?,
            OrderAction::Sync { id } => commands::order::sync(id).await?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Check => commands::config::check()?,
        },
    }
    Ok(())
}
