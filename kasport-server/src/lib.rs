//! kasport-server: HTTP server for the product catalog
//!
//! Exposes CRUD over products and their size/color variants as JSON,
//! backed by PostgreSQL through a shared connection pool.

pub mod db;
pub mod http;
pub mod models;

pub use db::{DbError, MemoryCatalog, PgCatalog, ProductStore};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
pub use models::{NewProduct, Product, ProductDetail, ProductFields, SizeVariant};
