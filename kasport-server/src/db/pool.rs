//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits. Callers that find
//! every connection busy wait in the pool's queue until `acquire_timeout`.
//! An optional [`AdmissionGate`] bounds how many operations may wait.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::DbError;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default wait for a free connection before the acquire fails.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the catalog database.
///
/// `url` wins over the individual parts when set.
#[derive(Clone)]
pub struct PoolConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    /// Require TLS for every connection
    pub ssl: bool,
    pub max_connections: u32,
    /// Operations allowed to queue beyond `max_connections` (0 = unbounded)
    pub queue_limit: usize,
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: None,
            database: "kasport".to_string(),
            ssl: false,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            queue_limit: 0,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

// Credentials never reach logs.
impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("ssl", &self.ssl)
            .field("max_connections", &self.max_connections)
            .field("queue_limit", &self.queue_limit)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish_non_exhaustive()
    }
}

impl PoolConfig {
    /// Build connect options from the URL or the individual parts.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is set but cannot be parsed.
    pub fn connect_options(&self) -> Result<PgConnectOptions, DbError> {
        let options = match &self.url {
            Some(url) => PgConnectOptions::from_str(url)?,
            None => {
                let options = PgConnectOptions::new()
                    .host(&self.host)
                    .port(self.port)
                    .username(&self.user)
                    .database(&self.database);
                match &self.password {
                    Some(password) => options.password(password),
                    None => options,
                }
            }
        };

        Ok(if self.ssl {
            options.ssl_mode(PgSslMode::Require)
        } else {
            options
        })
    }

    /// Gate matching this config's connection and queue limits.
    pub fn admission_gate(&self) -> AdmissionGate {
        AdmissionGate::new(self.max_connections, self.queue_limit)
    }
}

/// `host:port/database` for log lines.
pub fn describe(options: &PgConnectOptions) -> String {
    format!(
        "{}:{}/{}",
        options.get_host(),
        options.get_port(),
        options.get_database().unwrap_or("<default>")
    )
}

/// Create a PostgreSQL connection pool.
///
/// Connections are opened on first use, so a database that is down at
/// startup surfaces as failed requests rather than a failed boot.
///
/// # Errors
///
/// Returns an error if the connect options are invalid.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&PoolConfig::default())?;
/// ```
pub fn create_pool(config: &PoolConfig) -> Result<PgPool, DbError> {
    let options = config.connect_options()?;
    Ok(create_pool_with_options(options, config))
}

/// Create a PostgreSQL connection pool from prepared connect options.
pub fn create_pool_with_options(options: PgConnectOptions, config: &PoolConfig) -> PgPool {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_lazy_with(options)
}

/// Check out one connection and hand it straight back.
pub async fn check_connection(pool: &PgPool) -> Result<(), DbError> {
    let conn = pool.acquire().await?;
    drop(conn);
    Ok(())
}

/// Bounds the number of catalog operations admitted at once.
///
/// `max_connections` operations can hold a connection and `queue_limit`
/// more can wait for one; anything past that fails immediately.
#[derive(Debug, Clone, Default)]
pub struct AdmissionGate {
    slots: Option<Arc<Semaphore>>,
    limit: usize,
}

/// Held for the duration of one admitted operation.
#[must_use = "the slot is released when this is dropped"]
#[derive(Debug)]
pub struct Admission {
    _permit: Option<OwnedSemaphorePermit>,
}

impl AdmissionGate {
    /// A queue limit of 0 leaves the queue unbounded.
    pub fn new(max_connections: u32, queue_limit: usize) -> Self {
        if queue_limit == 0 {
            return Self::unbounded();
        }

        let limit = max_connections as usize + queue_limit;
        Self {
            slots: Some(Arc::new(Semaphore::new(limit))),
            limit,
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Take a slot without waiting.
    pub fn admit(&self) -> Result<Admission, DbError> {
        let Some(slots) = &self.slots else {
            return Ok(Admission { _permit: None });
        };

        slots
            .clone()
            .try_acquire_owned()
            .map(|permit| Admission {
                _permit: Some(permit),
            })
            .map_err(|_| DbError::Saturated { limit: self.limit })
    }

    /// Slots currently free, `None` when unbounded.
    pub fn available(&self) -> Option<usize> {
        self.slots.as_ref().map(|s| s.available_permits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.queue_limit, 0);
        assert_eq!(config.database, "kasport");
        assert!(!config.ssl);
    }

    #[test]
    fn debug_redacts_credentials() {
        let config = PoolConfig {
            url: Some("postgres://admin:hunter2@db/kasport".into()),
            password: Some("hunter2".into()),
            ..PoolConfig::default()
        };

        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("admin"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn options_from_parts() {
        let config = PoolConfig {
            host: "db.internal".into(),
            port: 6543,
            database: "shop".into(),
            ..PoolConfig::default()
        };

        let options = config.connect_options().unwrap();
        assert_eq!(describe(&options), "db.internal:6543/shop");
    }

    #[test]
    fn url_overrides_parts() {
        let config = PoolConfig {
            url: Some("postgres://user:pw@remote:5433/catalog".into()),
            host: "ignored".into(),
            ..PoolConfig::default()
        };

        let options = config.connect_options().unwrap();
        assert_eq!(describe(&options), "remote:5433/catalog");
    }

    #[test]
    fn bad_url_is_an_error() {
        let config = PoolConfig {
            url: Some("not a url".into()),
            ..PoolConfig::default()
        };

        assert!(config.connect_options().is_err());
    }

    #[test]
    fn unbounded_gate_always_admits() {
        let gate = AdmissionGate::new(2, 0);
        let held: Vec<_> = (0..64).map(|_| gate.admit().unwrap()).collect();
        assert_eq!(held.len(), 64);
        assert_eq!(gate.available(), None);
    }

    #[test]
    fn bounded_gate_rejects_past_queue_and_frees_on_drop() {
        let gate = AdmissionGate::new(2, 1);
        let first = gate.admit().unwrap();
        let _second = gate.admit().unwrap();
        let _third = gate.admit().unwrap();

        let err = gate.admit().unwrap_err();
        assert!(matches!(err, DbError::Saturated { limit: 3 }));

        drop(first);
        assert_eq!(gate.available(), Some(1));
        assert!(gate.admit().is_ok());
    }

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p kasport-server -- --ignored

    fn test_config() -> PoolConfig {
        PoolConfig {
            url: Some(std::env::var("DATABASE_URL").expect("DATABASE_URL required")),
            ..PoolConfig::default()
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let pool = create_pool(&test_config()).expect("pool creation failed");
        check_connection(&pool).await.expect("acquire failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_pool_access() {
        let pool = create_pool(&test_config()).expect("pool creation failed");

        // More tasks than connections: the extra ones queue
        let handles: Vec<_> = (0..25)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    let result: (i32,) = sqlx::query_as("SELECT $1::int")
                        .bind(i)
                        .fetch_one(&pool)
                        .await
                        .expect("concurrent query failed");
                    result.0
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.await.expect("task panicked");
            assert_eq!(result, i as i32);
        }
    }
}
