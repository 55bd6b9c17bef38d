//! Command implementations for the kasport CLI

pub mod database;
pub mod serve;
pub mod setup_db;

// Re-export main dispatcher functions for flat access from main.rs
pub use serve::run_serve;
pub use setup_db::run_setup_db;
