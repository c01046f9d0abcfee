//! Final response assembly.

use super::metrics::summarize;
use crate::models::{MergedPublication, ResolveResponse};

/// Informational notice for an empty, error-free resolution
pub const NO_RESULTS_MESSAGE: &str = "No results for the given filters";

/// Combine resolved publications with provider errors
///
/// Partial success returns both. An empty result keeps the provider errors
/// as-is, or carries [`NO_RESULTS_MESSAGE`] when nothing went wrong.
pub fn assemble(publications: Vec<MergedPublication>, mut errors: Vec<String>) -> ResolveResponse {
    if publications.is_empty() && errors.is_empty() {
        errors.push(NO_RESULTS_MESSAGE.to_string());
    }

    let metrics = summarize(&publications);
    ResolveResponse {
        publications,
        errors,
        metrics,
    }
}

/// Response for a request that had nothing to query
pub fn no_results() -> ResolveResponse {
    assemble(Vec::new(), Vec::new())
}
