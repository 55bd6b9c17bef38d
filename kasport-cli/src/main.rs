//! kasport CLI - product catalog HTTP service
//!
//! This is the main entry point for the kasport command-line tool, which provides:
//! - The catalog HTTP API (`serve` subcommand)
//! - First-time database provisioning (`setup-db` subcommand)
//!
//! Settings come from flags, the environment, or a `.env` file in the
//! working directory.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "kasport",
    author,
    version,
    about = "Product catalog HTTP service backed by PostgreSQL",
    long_about = "Serve CRUD endpoints for products with their size/stock and color \
                  variants, and provision the catalog database."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create the catalog database and tables if they do not exist
    SetupDb(commands::setup_db::SetupDbArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before parsing so clap sees variables from .env
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig { debug: cli.debug })?;
    match dotenv {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::SetupDb(args) => commands::run_setup_db(args).await?,
    }
    Ok(())
}
