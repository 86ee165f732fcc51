//! # crm-db
//!
//! PostgreSQL read layer for the CRM dictionary cache.
//!
//! This crate provides:
//! - Connection pool management
//! - `PgDictionaryReader`, the incremental per-category reads the
//!   dictionary pullers consume
//!
//! ## Example
//!
//! ```rust,ignore
//! use crm_db::{connect, DictionaryReader, PgDictionaryReader, PoolConfig};
//!
//! let pool = connect("postgres://localhost/crm", &PoolConfig::from_env()).await?;
//! let reader = PgDictionaryReader::new(pool);
//! let tags = reader.fetch_tags(since).await?;
//! ```
pub mod dictionary_reader;
pub mod pool;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use crm_core::*;

pub use dictionary_reader::PgDictionaryReader;
pub use pool::{connect, log_pool_metrics, PoolConfig};
