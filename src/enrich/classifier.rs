//! Abstract classification: primary research vs. review.

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::models::{PublicationType, SourceRecord};
use crate::sources::SourceError;
use crate::utils::{fetch_text, HttpClient};

const REVIEW_MARKERS: [&str; 3] = ["systematic review", "meta-analysis", "scoping review"];

/// Maps an abstract onto a [`PublicationType`]
#[async_trait]
pub trait Classifier: Send + Sync + std::fmt::Debug {
    async fn classify(&self, text: &str) -> Result<PublicationType, SourceError>;
}

/// Deterministic keyword heuristic; never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn label(text: &str) -> PublicationType {
        let lower = text.to_lowercase();
        if REVIEW_MARKERS.iter().any(|marker| lower.contains(marker)) {
            PublicationType::Review
        } else {
            PublicationType::PrimaryResearch
        }
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<PublicationType, SourceError> {
        Ok(Self::label(text))
    }
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    r#abstract: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    label: String,
}

/// Remote classifier: `POST {endpoint}` with `{"abstract": ...}`, expects `{"label": ...}`
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: HttpClient,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(client: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<PublicationType, SourceError> {
        let request = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { r#abstract: text });
        let body = fetch_text(request, "classifier").await?;
        let response: ClassifyResponse = serde_json::from_str(&body)?;

        PublicationType::from_label(&response.label)
            .ok_or_else(|| SourceError::Parse(format!("unknown label '{}'", response.label)))
    }
}

/// Classify an abstract, falling back to the keyword heuristic on any failure
pub async fn classify_or_fallback(classifier: &dyn Classifier, text: &str) -> PublicationType {
    if text.trim().is_empty() {
        return KeywordClassifier::label(text);
    }

    match classifier.classify(text).await {
        Ok(label) => label,
        Err(e) => {
            tracing::debug!("Classifier unavailable, using keyword fallback: {}", e);
            KeywordClassifier::label(text)
        }
    }
}

/// Set `classification` on every record, once each
pub async fn classify_records(classifier: &dyn Classifier, records: &mut [SourceRecord]) {
    let labels = join_all(
        records
            .iter()
            .map(|record| classify_or_fallback(classifier, &record.r#abstract)),
    )
    .await;

    for (record, label) in records.iter_mut().zip(labels) {
        record.classification = label;
    }
}
