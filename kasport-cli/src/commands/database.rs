//! Database connection arguments shared by every command

use std::fmt;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args};
use kasport_server::db::PoolConfig;

/// Where the catalog database lives and how many connections to use.
///
/// Every flag falls back to an environment variable, so a `.env` file is
/// enough to configure a deployment.
#[derive(Args, Clone)]
pub struct DatabaseArgs {
    /// Full connection URL; overrides the individual DB_* settings
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Database server host
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    /// Database server port
    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    /// Database user
    #[arg(long, env = "DB_USER", default_value = "postgres")]
    pub db_user: String,

    /// Database password
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Catalog database name
    #[arg(long, env = "DB_NAME", default_value = "kasport")]
    pub db_name: String,

    /// Require TLS for database connections
    #[arg(long, env = "DB_SSL", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub db_ssl: bool,

    /// Maximum open connections in the pool
    #[arg(long, env = "DB_CONNECTION_LIMIT", default_value_t = 10)]
    pub db_connection_limit: u32,

    /// Requests allowed to wait for a connection (0 = unbounded)
    #[arg(long, env = "DB_QUEUE_LIMIT", default_value_t = 0)]
    pub db_queue_limit: usize,

    /// Seconds to wait for a free connection
    #[arg(long, env = "DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 30)]
    pub db_acquire_timeout_secs: u64,
}

impl DatabaseArgs {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database_url.clone(),
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_name.clone(),
            ssl: self.db_ssl,
            max_connections: self.db_connection_limit,
            queue_limit: self.db_queue_limit,
            acquire_timeout: Duration::from_secs(self.db_acquire_timeout_secs),
        }
    }
}

// Delegates to PoolConfig, which redacts credentials.
impl fmt::Debug for DatabaseArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.pool_config(), f)
    }
}
