//! Shared library for the catalog ingestion pipeline.
//!
//! This crate provides the pieces every binary needs:
//! - Configuration management
//! - Logging infrastructure
//! - Database connection and schema
//! - Row models and the `Catalog` persistence primitives

pub mod catalog;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use catalog::Catalog;
pub use config::Config;
pub use db::Database;
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
