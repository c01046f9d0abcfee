//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{AuthorQuery, Provider, SourceRecord, SourceRecordBuilder};
use crate::sources::{Source, SourceError};

/// A mock source that returns a predefined outcome.
#[derive(Debug)]
pub struct MockSource {
    provider: Provider,
    outcome: Mutex<Result<Vec<SourceRecord>, String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a mock that succeeds with no records.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            outcome: Mutex::new(Ok(Vec::new())),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock that succeeds with `records`.
    pub fn with_records(provider: Provider, records: Vec<SourceRecord>) -> Self {
        let source = Self::new(provider);
        source.set_records(records);
        source
    }

    /// Create a mock that fails with an API error carrying `message`.
    pub fn failing(provider: Provider, message: impl Into<String>) -> Self {
        let source = Self::new(provider);
        source.set_error(message);
        source
    }

    /// Sleep before answering, to exercise concurrent fan-out.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_records(&self, records: Vec<SourceRecord>) {
        *self.outcome.lock().unwrap_or_else(|e| e.into_inner()) = Ok(records);
    }

    pub fn set_error(&self, message: impl Into<String>) {
        *self.outcome.lock().unwrap_or_else(|e| e.into_inner()) = Err(message.into());
    }

    /// Number of times `query` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn query(&self, _query: &AuthorQuery) -> Result<Vec<SourceRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.outcome.lock().unwrap_or_else(|e| e.into_inner()).clone();
        outcome.map_err(SourceError::Api)
    }
}

/// Helper function to create a mock record for testing.
pub fn make_record(provider: Provider, title: &str, doi: Option<&str>) -> SourceRecord {
    let mut builder = SourceRecordBuilder::new(provider, title)
        .url(format!("https://example.com/{}/{}", provider.id(), title.len()));
    if let Some(doi) = doi {
        builder = builder.doi(doi);
    }
    builder.build()
}
