//! Database layer - connection pool, schema and the product store
//!
//! # Design Principles
//!
//! - One explicitly constructed `PgPool`, injected into handlers via router state
//! - Rows decode into explicit structs at this boundary
//! - Multi-table writes run inside a single transaction
//! - Rely on DB constraints, no check-then-insert

pub mod error;
pub mod memory;
pub mod pool;
pub mod repos;
pub mod schema;
pub mod store;

pub use error::DbError;
pub use memory::MemoryCatalog;
pub use pool::{create_pool, AdmissionGate, PoolConfig};
pub use repos::PgCatalog;
pub use store::ProductStore;
