//! Core data models for the dictionary cache.
//!
//! Rows are what the storage reader returns; records are what the
//! dictionary keeps and hands out.

pub mod category;
pub mod records;
pub mod rows;
pub mod status_graph;

pub use category::Category;
pub use records::*;
pub use rows::*;
pub use status_graph::{ProjectOptions, StatusGraph};
