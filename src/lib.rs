//! # Scholar Merge
//!
//! Reconciles scholarly-publication metadata for a set of authors across
//! several bibliographic providers and derives summary bibliometrics.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (SourceRecord, MergedPublication, AuthorQuery, etc.)
//! - [`sources`]: Provider adapters behind the [`Source`] trait
//! - [`engine`]: Name matching, fan-out, identity resolution, bibliometrics
//! - [`enrich`]: Abstract classification and citation-rate lookup
//! - [`utils`]: HTTP client, retry, text normalization
//! - [`config`]: Configuration management

pub mod config;
pub mod engine;
pub mod enrich;
pub mod models;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use engine::Engine;
pub use models::{MergedPublication, ResolveResponse, SourceRecord};
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
