//! Database layer
//!
//! This module provides database abstraction for the blog:
//! - Postgres (production, usually a serverless endpoint behind `DATABASE_URL`)
//! - SQLite (local development and tests)
//!
//! The database is optional. `create_pool` returns `None` when no URL is
//! configured and the blog service falls back to Markdown files.
//!
//! # Usage
//!
//! ```ignore
//! use folio::config::DatabaseConfig;
//! use folio::db::{create_pool, migrations};
//!
//! if let Some(pool) = create_pool(&config).await? {
//!     migrations::run_migrations(&pool).await?;
//!     pool.ping().await?;
//! }
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, redact_url, Backend, DatabasePool, DynDatabasePool,
    PostgresDatabase, SqliteDatabase,
};
