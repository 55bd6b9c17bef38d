//! One-time local database provisioning
//!
//! Creates the catalog database on the server if it is missing, then the
//! catalog tables inside it.

use anyhow::{Context, Result};
use clap::Parser;

use kasport_server::db::pool::{create_pool_with_options, describe};
use kasport_server::db::schema;

use super::database::DatabaseArgs;

/// Arguments for the setup-db command
#[derive(Parser, Debug)]
pub struct SetupDbArgs {
    /// Only create the database, not the tables
    #[arg(long)]
    pub skip_schema: bool,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Create the database (and tables) if they do not exist
pub async fn run_setup_db(args: SetupDbArgs) -> Result<()> {
    let pool_config = args.database.pool_config();
    let options = pool_config
        .connect_options()
        .context("Invalid database settings")?;
    let target = describe(&options);

    let created = schema::create_database_if_missing(&options)
        .await
        .with_context(|| format!("Failed to create database {}", target))?;

    if created {
        tracing::info!(database = %target, "Database created");
    } else {
        tracing::info!(database = %target, "Database already exists");
    }

    if !args.skip_schema {
        let pool = create_pool_with_options(options, &pool_config);
        schema::ensure(&pool)
            .await
            .context("Failed to create catalog tables")?;
        pool.close().await;
    }

    tracing::info!(database = %target, "Local setup complete");
    Ok(())
}
