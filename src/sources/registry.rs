//! Registry holding the configured provider adapters.

use std::sync::Arc;
use std::time::Duration;

use super::{PubMedSource, ScopusSource, Source, SourceError, WebOfScienceSource};
use crate::config::Config;
use crate::enrich::{Classifier, HttpClassifier, KeywordClassifier};
use crate::models::Provider;
use crate::utils::{HttpClient, RetryConfig};

/// The set of provider adapters queried for every request
///
/// Sources are kept in [`Provider::FOLD_ORDER`] so that fan-out results and
/// error messages come out in a fixed order.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the three provider adapters from configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = HttpClient::with_timeout(Duration::from_secs(
            config.search.request_timeout_secs,
        ))?;
        let retry = RetryConfig::from(&config.retry);
        let classifier = build_classifier(config, &client);

        let mut registry = Self::new();
        registry.register(Arc::new(WebOfScienceSource::new(
            client.clone(),
            &config.endpoints.web_of_science,
            config.api_keys.web_of_science.clone(),
            retry,
            Arc::clone(&classifier),
        )));
        registry.register(Arc::new(
            ScopusSource::new(
                client.clone(),
                &config.endpoints.scopus,
                config.api_keys.scopus.clone(),
                retry,
                Arc::clone(&classifier),
            )
            .with_inst_token(config.api_keys.scopus_inst_token.clone()),
        ));
        registry.register(Arc::new(PubMedSource::new(
            client,
            &config.endpoints.pubmed,
            config.api_keys.ncbi.clone(),
            retry,
            classifier,
        )));

        Ok(registry)
    }

    /// Register a source, replacing any existing source for the same provider
    pub fn register(&mut self, source: Arc<dyn Source>) {
        let provider = source.provider();
        self.sources.retain(|s| s.provider() != provider);
        self.sources.push(source);
        self.sources.sort_by_key(|s| fold_position(s.provider()));
    }

    /// Get the source for a provider
    pub fn get(&self, provider: Provider) -> Option<&Arc<dyn Source>> {
        self.sources.iter().find(|s| s.provider() == provider)
    }

    /// All sources in fold order
    pub fn all(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn fold_position(provider: Provider) -> usize {
    Provider::FOLD_ORDER
        .iter()
        .position(|p| *p == provider)
        .unwrap_or(usize::MAX)
}

/// The configured remote classifier, or the keyword heuristic
pub fn build_classifier(config: &Config, client: &HttpClient) -> Arc<dyn Classifier> {
    match &config.endpoints.classifier {
        Some(endpoint) => Arc::new(HttpClassifier::new(client.clone(), endpoint.clone())),
        None => Arc::new(KeywordClassifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockSource;

    #[test]
    fn test_from_config_registers_all_providers() {
        let registry = SourceRegistry::from_config(&Config::default()).unwrap();

        assert_eq!(registry.len(), 3);
        let order: Vec<_> = registry.all().iter().map(|s| s.provider()).collect();
        assert_eq!(order, Provider::FOLD_ORDER.to_vec());
        assert_eq!(registry.get(Provider::Scopus).unwrap().name(), "Scopus");
    }

    #[test]
    fn test_register_keeps_fold_order_and_replaces() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(MockSource::new(Provider::PubMed)));
        registry.register(Arc::new(MockSource::new(Provider::WebOfScience)));
        registry.register(Arc::new(MockSource::new(Provider::PubMed)));

        let order: Vec<_> = registry.all().iter().map(|s| s.provider()).collect();
        assert_eq!(order, vec![Provider::WebOfScience, Provider::PubMed]);
        assert!(registry.get(Provider::Scopus).is_none());
    }
}
