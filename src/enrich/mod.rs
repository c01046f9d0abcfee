//! External capabilities consumed by adapters and the engine.
//!
//! - [`Classifier`]: abstract → [`crate::models::PublicationType`], always
//!   backed by the [`KeywordClassifier`] fallback
//! - [`CitationRateLookup`]: identifier → relative citation ratio, with
//!   [`enrich_citation_rates`] doing the fixed-size batching

mod classifier;
mod icite;

pub use classifier::{
    classify_or_fallback, classify_records, Classifier, HttpClassifier, KeywordClassifier,
};
pub use icite::{enrich_citation_rates, CitationRateLookup, ICiteClient, ICITE_BATCH_SIZE};
