//! Catalog schema bootstrap
//!
//! Idempotent `CREATE ... IF NOT EXISTS` statements, plus creation of the
//! catalog database itself for first-time local setup. There is no
//! versioning: the statements describe the one schema the queries expect.

use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection, PgPool};

use super::pool::describe;
use super::DbError;

/// Database every PostgreSQL server has, used to create the catalog one.
const MAINTENANCE_DATABASE: &str = "postgres";

/// Create the catalog tables if they are missing.
///
/// Variant rows reference their product with `ON DELETE CASCADE`, so a
/// product delete never leaves orphaned sizes or colors behind.
pub async fn ensure(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Ensuring catalog schema...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            sub_category TEXT,
            price DOUBLE PRECISION NOT NULL,
            description TEXT,
            brand TEXT,
            image TEXT,
            in_stock BOOLEAN NOT NULL DEFAULT TRUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_sizes (
            id BIGSERIAL PRIMARY KEY,
            product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            size TEXT NOT NULL,
            stock INTEGER NOT NULL CHECK (stock >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_colors (
            id BIGSERIAL PRIMARY KEY,
            product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            color TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    tracing::info!("Catalog schema ready");
    Ok(())
}

async fn create_indexes(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_category ON products(category)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_product_sizes_product ON product_sizes(product_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_product_colors_product ON product_colors(product_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the database named in `options` if the server does not have it.
///
/// Connects to the `postgres` maintenance database to do so. Returns
/// `true` when the database was created, `false` when it already existed.
pub async fn create_database_if_missing(options: &PgConnectOptions) -> Result<bool, DbError> {
    let name = options
        .get_database()
        .ok_or_else(|| DbError::Config("no database name configured".to_string()))?
        .to_owned();

    let maintenance = options.clone().database(MAINTENANCE_DATABASE);
    let mut conn = PgConnection::connect_with(&maintenance).await?;
    tracing::info!(server = %describe(&maintenance), "Connected to database server");

    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&name)
            .fetch_one(&mut conn)
            .await?;

    if !exists {
        // Identifiers cannot be bound as parameters. template1 may carry
        // another encoding; template0 accepts any.
        sqlx::query(&format!(
            "CREATE DATABASE {} ENCODING 'UTF8' TEMPLATE template0",
            quote_ident(&name)
        ))
        .execute(&mut conn)
        .await?;
    }

    conn.close().await?;
    Ok(!exists)
}

/// Quote an SQL identifier, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_identifier() {
        assert_eq!(quote_ident("kasport"), "\"kasport\"");
    }

    #[test]
    fn escapes_embedded_quotes() {
        assert_eq!(quote_ident("ka\"sport"), "\"ka\"\"sport\"");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn ensure_is_idempotent() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgPool::connect(&url).await.expect("connect failed");

        ensure(&pool).await.expect("first ensure failed");
        ensure(&pool).await.expect("second ensure failed");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn creates_missing_database_once() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let options: PgConnectOptions = url.parse().expect("invalid DATABASE_URL");
        let target = options.clone().database("kasport_setup_check");

        let mut admin = PgConnection::connect_with(&options.clone().database(MAINTENANCE_DATABASE))
            .await
            .expect("connect failed");
        sqlx::query("DROP DATABASE IF EXISTS kasport_setup_check")
            .execute(&mut admin)
            .await
            .expect("drop failed");

        assert!(create_database_if_missing(&target).await.expect("create failed"));
        assert!(!create_database_if_missing(&target).await.expect("second call failed"));

        let (encoding,): (String,) = sqlx::query_as(
            "SELECT pg_encoding_to_char(encoding) FROM pg_database WHERE datname = $1",
        )
        .bind("kasport_setup_check")
        .fetch_one(&mut admin)
        .await
        .expect("encoding lookup failed");
        assert_eq!(encoding, "UTF8");

        sqlx::query("DROP DATABASE kasport_setup_check")
            .execute(&mut admin)
            .await
            .expect("cleanup failed");
    }
}
