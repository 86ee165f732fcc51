//! # crm-core
//!
//! Core types, traits, and abstractions for the CRM dictionary cache.
//!
//! This crate provides the row and record models, the category list, and
//! the trait seams (storage reader, pub/sub, photo URLs) that the other
//! crates depend on.
//!
//! ## Log fields
//!
//! Every event carries `subsystem` (`dictionary`, `database`, `server`)
//! and `component` (`puller`, `coordinator`, `supervisor`, `pool`,
//! `pubsub`, ...). Per-row merges log at TRACE, refresh details at DEBUG,
//! lifecycle and refresh completions at INFO, automatic fallbacks at WARN
//! and failures at ERROR.

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
