//! HTTP server command for the product catalog API
//!
//! Runs the kasport HTTP server against a PostgreSQL catalog.

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use clap::Parser;

use kasport_server::db::pool::{check_connection, create_pool_with_options, describe};
use kasport_server::db::{schema, PgCatalog};
use kasport_server::http::{run_server, AppState, ServerConfig};

use super::database::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, env = "KASPORT_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, short = 'p', env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Allowed CORS origins, comma separated (default: any origin)
    #[arg(long = "cors-origin", env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<HeaderValue>,

    /// Do not create missing catalog tables at startup
    #[arg(long)]
    pub skip_schema: bool,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let pool_config = args.database.pool_config();
    let options = pool_config
        .connect_options()
        .context("Invalid database settings")?;
    let target = describe(&options);

    tracing::info!(
        database = %target,
        max_connections = pool_config.max_connections,
        queue_limit = pool_config.queue_limit,
        "Creating database pool"
    );
    let pool = create_pool_with_options(options, &pool_config);

    // A database that is down at boot only fails requests until it returns
    match check_connection(&pool).await {
        Ok(()) => {
            tracing::info!(database = %target, "Database connection OK");
            if !args.skip_schema {
                schema::ensure(&pool)
                    .await
                    .context("Failed to ensure catalog schema")?;
            }
        }
        Err(e) => tracing::error!(database = %target, "Database connection failed: {}", e),
    }

    let catalog = PgCatalog::new(pool, pool_config.admission_gate());
    let config = ServerConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
        cors_origins: args.cors_origins,
    };

    // Run server (blocks until shutdown)
    run_server(AppState::new(catalog), config)
        .await
        .context("Server error")?;

    Ok(())
}
