//! Fortress Demo CLI
//!
//! Command-line interface for exercising the Fortress vault protocol
//! against an in-memory mock chain: no network, no real funds.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "fortress-demo")]
#[command(about = "Fortress Demo CLI - drive the vault protocol against a mock chain", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full vault lifecycle: create, fund, withdraw, rescue
    Lifecycle {
        /// Withdrawal limit in satoshis
        #[arg(long, default_value_t = 10_000)]
        limit: u64,

        /// Amount to withdraw in satoshis
        #[arg(long, default_value_t = 5_000)]
        withdraw: u64,

        /// Initial vault funding in satoshis
        #[arg(long, default_value_t = 50_000)]
        deposit: u64,
    },

    /// Seed a noisy history and resolve the canonical registry record
    Scan {
        /// Number of competing registry records to publish
        #[arg(long, default_value_t = 3)]
        records: u32,
    },

    /// Show the fee convergence for a withdrawal
    Build {
        /// Vault balance in satoshis
        #[arg(long, default_value_t = 50_000)]
        balance: u64,

        /// Withdrawal limit in satoshis
        #[arg(long, default_value_t = 10_000)]
        limit: u64,

        /// Amount to withdraw in satoshis
        #[arg(long, default_value_t = 5_000)]
        amount: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
    tracing::debug!("verbose logging enabled");

    match cli.command {
        Commands::Lifecycle {
            limit,
            withdraw,
            deposit,
        } => commands::lifecycle::run(limit, withdraw, deposit).await,
        Commands::Scan { records } => commands::scan::run(records).await,
        Commands::Build {
            balance,
            limit,
            amount,
        } => commands::build::run(balance, limit, amount),
    }
}
