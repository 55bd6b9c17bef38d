//! HTTP server layer
//!
//! Axum server with:
//! - CORS (any origin unless origins are configured)
//! - Request tracing
//! - Panic and unknown-route handling as JSON errors
//! - Graceful shutdown

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
