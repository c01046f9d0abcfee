//! Multi-source reconciliation engine.
//!
//! The [`Engine`] fans an author query out to every registered provider,
//! folds the per-provider record lists into canonical publications,
//! optionally attaches citation rates, and summarizes the result.
//!
//! # Example
//!
//! ```no_run
//! use scholar_merge::config::Config;
//! use scholar_merge::engine::Engine;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::from_config(&Config::default())?;
//! let response = engine
//!     .resolve_publications(&["Jordan Lee"], None, None)
//!     .await;
//!
//! for publication in &response.publications {
//!     println!("{} ({})", publication.title, publication.citation_count);
//! }
//! # Ok(())
//! # }
//! ```

mod assembly;
mod fanout;
mod metrics;
mod name_match;
mod resolver;

pub use assembly::{assemble, no_results, NO_RESULTS_MESSAGE};
pub use fanout::{fan_out, FanOutResult, ALL_SOURCES_FAILED};
pub use metrics::{impact_index, summarize, weighted_citation_rate_sum};
pub use name_match::{any_author_matches, name_matches, NameParts};
pub use resolver::{merge, merge_records, MergeKey, Resolution};

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::enrich::{enrich_citation_rates, CitationRateLookup, ICiteClient, ICITE_BATCH_SIZE};
use crate::models::{AuthorQuery, DateRange, ResolveResponse};
use crate::sources::{SourceError, SourceRegistry};
use crate::utils::{HttpClient, RetryConfig};

/// Entry point for resolving an author's publications across providers
///
/// The engine holds no per-request state; one instance can serve any number
/// of concurrent requests.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: SourceRegistry,
    rates: Option<Arc<dyn CitationRateLookup>>,
    batch_size: usize,
    max_results: usize,
}

impl Engine {
    /// Engine over the given sources, without citation-rate enrichment
    pub fn new(registry: SourceRegistry) -> Self {
        Self {
            registry,
            rates: None,
            batch_size: ICITE_BATCH_SIZE,
            max_results: 100,
        }
    }

    /// Build the three provider adapters and the iCite client from configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let registry = SourceRegistry::from_config(config)?;
        let mut engine = Self::new(registry).with_max_results(config.search.max_results_per_source);

        if config.enrichment.enabled {
            let client = HttpClient::with_timeout(Duration::from_secs(
                config.search.request_timeout_secs,
            ))?;
            let icite = ICiteClient::new(
                client,
                &config.endpoints.icite,
                RetryConfig::from(&config.retry),
            );
            engine = engine
                .with_rate_lookup(Arc::new(icite))
                .with_batch_size(config.enrichment.batch_size);
        }

        Ok(engine)
    }

    pub fn with_rate_lookup(mut self, lookup: Arc<dyn CitationRateLookup>) -> Self {
        self.rates = Some(lookup);
        self
    }

    /// Skip citation-rate enrichment
    pub fn without_enrichment(mut self) -> Self {
        self.rates = None;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Resolve the publications of the given authors within optional date bounds
    ///
    /// Never fails: provider failures come back as entries in `errors`
    /// alongside whatever the remaining providers returned.
    pub async fn resolve_publications<S: AsRef<str>>(
        &self,
        author_names: &[S],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ResolveResponse {
        let query = AuthorQuery::new(author_names)
            .range(DateRange::new(start, end))
            .max_results(self.max_results);
        self.resolve(&query).await
    }

    /// Resolve a prepared query
    pub async fn resolve(&self, query: &AuthorQuery) -> ResolveResponse {
        if query.is_empty() {
            tracing::debug!("No usable author names, skipping provider queries");
            return no_results();
        }

        tracing::info!(
            "Resolving publications for {} author(s) across {} sources",
            query.authors.len(),
            self.registry.len()
        );

        let fanned = fan_out(self.registry.all(), query).await;
        let Resolution {
            mut publications,
            dropped,
        } = merge(&fanned.records);

        tracing::info!(
            "Merged {} records into {} publications ({} dropped)",
            fanned.record_count(),
            publications.len(),
            dropped
        );

        if let Some(lookup) = &self.rates {
            enrich_citation_rates(&mut publications, lookup.as_ref(), self.batch_size).await;
        }

        assemble(publications, fanned.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;
    use crate::sources::mock::make_record;
    use crate::sources::MockSource;

    #[tokio::test]
    async fn test_blank_names_skip_providers() {
        let source = Arc::new(MockSource::with_records(
            Provider::PubMed,
            vec![make_record(Provider::PubMed, "A", None)],
        ));
        let mut registry = SourceRegistry::new();
        registry.register(source.clone());

        let response = Engine::new(registry)
            .resolve_publications(&["", "   "], None, None)
            .await;

        assert!(response.publications.is_empty());
        assert_eq!(response.errors, vec![NO_RESULTS_MESSAGE]);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_from_config_without_keys_reports_config_errors() {
        let mut config = Config::default();
        config.enrichment.enabled = false;
        config.endpoints.pubmed = "http://127.0.0.1:9".to_string();
        config.retry.max_attempts = 1;

        let engine = Engine::from_config(&config).unwrap();
        let response = engine
            .resolve_publications(&["Jordan Lee"], None, None)
            .await;

        assert!(response.publications.is_empty());
        assert_eq!(response.errors.len(), 3);
        assert!(response.errors[0].starts_with("Web of Science: Configuration error"));
        assert!(response.errors[1].starts_with("Scopus: Configuration error"));
        assert!(response.errors[2].starts_with("PubMed: "));
    }
}
