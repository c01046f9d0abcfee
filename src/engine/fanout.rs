//! Concurrent fan-out across provider adapters.

use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{AuthorQuery, Provider, SourceRecord};
use crate::sources::Source;

/// Shown when every provider failed without reporting anything
pub const ALL_SOURCES_FAILED: &str = "All sources failed to return results";

/// Records per successful provider plus one message per failed provider
#[derive(Debug, Clone, Default)]
pub struct FanOutResult {
    pub records: BTreeMap<Provider, Vec<SourceRecord>>,
    pub errors: Vec<String>,
}

impl FanOutResult {
    pub fn succeeded(&self) -> usize {
        self.records.len()
    }

    pub fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

/// Query every source concurrently and wait for all of them
///
/// A failing provider contributes an error message (`"{provider}: {error}"`)
/// and never cancels the others. Errors keep the order of `sources`.
pub async fn fan_out(sources: &[Arc<dyn Source>], query: &AuthorQuery) -> FanOutResult {
    let futures = sources.iter().map(|source| {
        let source = Arc::clone(source);
        async move {
            let outcome = source.query(query).await;
            (source.provider(), source.name().to_string(), outcome)
        }
    });

    let mut result = FanOutResult::default();
    for (provider, name, outcome) in join_all(futures).await {
        match outcome {
            Ok(records) => {
                tracing::info!("{} returned {} records", name, records.len());
                result.records.entry(provider).or_default().extend(records);
            }
            Err(e) => {
                tracing::warn!("{} query failed: {}", name, e);
                result.errors.push(format!("{}: {}", name, e));
            }
        }
    }

    if result.records.is_empty() && result.errors.is_empty() {
        result.errors.push(ALL_SOURCES_FAILED.to_string());
    }

    result
}
