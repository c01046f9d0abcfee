//! Provider adapters behind a common trait.
//!
//! Each adapter turns an [`AuthorQuery`] into normalized [`SourceRecord`]s for
//! one bibliographic provider. Query construction, payload parsing, timeouts
//! and retries all stay inside the adapter; the engine only ever sees the
//! normalized record shape or a [`SourceError`].
//!
//! | Adapter | Provider | Upstream |
//! |---------|----------|----------|
//! | [`WebOfScienceSource`] | citation index | Web of Science Starter API |
//! | [`ScopusSource`] | abstracting/indexing | Scopus Search API |
//! | [`PubMedSource`] | biomedical literature | NCBI E-utilities |
//!
//! Web of Science author search is a wildcard on surname and initial, so that
//! adapter post-filters its records with [`crate::engine::name_matches`].

mod pubmed;
mod registry;
mod scopus;
mod wos;

pub mod mock;

pub use mock::MockSource;
pub use pubmed::PubMedSource;
pub use registry::{build_classifier, SourceRegistry};
pub use scopus::ScopusSource;
pub use wos::WebOfScienceSource;

use async_trait::async_trait;

use crate::models::{AuthorQuery, Provider, SourceRecord};

/// Interface implemented by every provider adapter
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Provider this adapter queries
    fn provider(&self) -> Provider;

    /// Human-readable name, used as the prefix of error messages
    fn name(&self) -> &str {
        self.provider().name()
    }

    /// Fetch the normalized records of the query's authors
    async fn query(&self, query: &AuthorQuery) -> Result<Vec<SourceRecord>, SourceError>;
}

/// Errors that can occur when interacting with a provider
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (XML, JSON)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing or rejected credentials, bad endpoint
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Error status from the provider API
    #[error("API error: {0}")]
    Api(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::DeError> for SourceError {
    fn from(err: quick_xml::DeError) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}
