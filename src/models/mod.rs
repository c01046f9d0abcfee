//! Core data models for provider records, merged publications and queries.

mod publication;
mod record;
mod search;

pub use publication::MergedPublication;
pub use record::{Provider, PublicationType, SourceRecord, SourceRecordBuilder, UNTITLED};
pub use search::{AuthorQuery, Bibliometrics, DateRange, DateRangeError, ResolveResponse};
