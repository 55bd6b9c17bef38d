//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Parameterized statements only, never string-built values
//! - Rows decode into model structs via `FromRow`
//! - Uses transactions for multi-step operations

pub mod products;

pub use products::PgCatalog;
