//! Web of Science adapter using the Clarivate Web of Science Starter API.

use async_trait::async_trait;
use chrono::Datelike;
use serde::Deserialize;
use std::sync::Arc;

use crate::engine::{any_author_matches, NameParts};
use crate::enrich::{classify_records, Classifier};
use crate::models::{AuthorQuery, Provider, SourceRecord, SourceRecordBuilder};
use crate::sources::{Source, SourceError};
use crate::utils::{fetch_text, with_retry, HttpClient, RetryConfig};

/// Starter API page-size ceiling
const PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
struct WosResponse {
    #[serde(default)]
    metadata: Option<WosMetadata>,
    #[serde(default)]
    hits: Vec<WosDocument>,
}

#[derive(Debug, Deserialize)]
struct WosMetadata {
    #[serde(default)]
    total: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WosDocument {
    uid: Option<String>,
    title: Option<String>,
    source: Option<WosPublicationSource>,
    names: Option<WosNames>,
    links: Option<WosLinks>,
    #[serde(default)]
    citations: Vec<WosCitation>,
    identifiers: Option<WosIdentifiers>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WosPublicationSource {
    source_title: Option<String>,
    publish_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct WosNames {
    #[serde(default)]
    authors: Vec<WosAuthor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WosAuthor {
    display_name: Option<String>,
    wos_standard: Option<String>,
}

impl WosAuthor {
    fn name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .or(self.wos_standard.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct WosLinks {
    record: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WosCitation {
    db: Option<String>,
    count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WosIdentifiers {
    doi: Option<String>,
}

/// Web of Science source
///
/// The Starter API only supports wildcard `AU=` author search ("Lee J*"),
/// which also returns namesakes. Records are therefore kept only when one of
/// their authors matches a target name.
#[derive(Debug, Clone)]
pub struct WebOfScienceSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    retry: RetryConfig,
    classifier: Arc<dyn Classifier>,
}

impl WebOfScienceSource {
    pub fn new(
        client: HttpClient,
        base_url: impl Into<String>,
        api_key: Option<String>,
        retry: RetryConfig,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            retry,
            classifier,
        }
    }

    /// Build the Starter API `q` expression
    fn build_query(query: &AuthorQuery) -> String {
        let clauses: Vec<String> = query
            .authors
            .iter()
            .filter_map(|name| NameParts::from_full_name(name))
            .map(|parts| match parts.initial {
                Some(initial) => format!("AU=({} {}*)", parts.last, initial),
                None => format!("AU=({})", parts.last),
            })
            .collect();

        let mut expr = if clauses.len() == 1 {
            clauses[0].clone()
        } else {
            format!("({})", clauses.join(" OR "))
        };

        if !query.range.is_unbounded() {
            let start = query.range.start_year().unwrap_or(1900);
            let end = query
                .range
                .end_year()
                .unwrap_or_else(|| chrono::Utc::now().year());
            expr.push_str(&format!(" AND PY=({}-{})", start, end));
        }

        expr
    }

    fn build_url(&self, expr: &str, page: usize, limit: usize) -> String {
        format!(
            "{}/documents?db=WOS&q={}&limit={}&page={}",
            self.base_url,
            urlencoding::encode(expr),
            limit,
            page
        )
    }

    /// Parse one page; returns every record with its structured author names
    fn parse_page(body: &str) -> Result<(Vec<(SourceRecord, Vec<String>)>, usize), SourceError> {
        let response: WosResponse = serde_json::from_str(body)?;
        let total = response.metadata.map(|m| m.total).unwrap_or(0);

        let records = response
            .hits
            .into_iter()
            .map(|doc| {
                let names: Vec<String> = doc
                    .names
                    .as_ref()
                    .map(|n| n.authors.iter().filter_map(|a| a.name()).map(str::to_string).collect())
                    .unwrap_or_default();

                let citation_count = doc
                    .citations
                    .iter()
                    .find(|c| c.db.as_deref() == Some("WOS"))
                    .or_else(|| doc.citations.first())
                    .and_then(|c| c.count)
                    .unwrap_or(0);

                let source = doc.source.as_ref();
                let record = SourceRecordBuilder::new(
                    Provider::WebOfScience,
                    doc.title.clone().unwrap_or_default(),
                )
                .record_id(doc.uid.clone().unwrap_or_default())
                .authors(names.join("; "))
                .journal(source.and_then(|s| s.source_title.clone()).unwrap_or_default())
                .publication_date(
                    source
                        .and_then(|s| s.publish_year)
                        .map(|y| y.to_string())
                        .unwrap_or_default(),
                )
                .citation_count(citation_count)
                .doi(doc.identifiers.and_then(|i| i.doi).unwrap_or_default())
                .url(doc.links.and_then(|l| l.record).unwrap_or_default())
                .build();

                (record, names)
            })
            .collect();

        Ok((records, total))
    }
}

#[async_trait]
impl Source for WebOfScienceSource {
    fn provider(&self) -> Provider {
        Provider::WebOfScience
    }

    async fn query(&self, query: &AuthorQuery) -> Result<Vec<SourceRecord>, SourceError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            SourceError::Config("Web of Science API key is not configured".to_string())
        })?;

        if query.is_empty() {
            return Ok(Vec::new());
        }

        let expr = Self::build_query(query);
        let mut candidates = Vec::new();
        let mut page = 1;

        while candidates.len() < query.max_results {
            let url = self.build_url(&expr, page, PAGE_SIZE);
            let body = with_retry(self.retry, || {
                fetch_text(
                    self.client.get(&url).header("X-ApiKey", api_key),
                    "Web of Science",
                )
            })
            .await?;

            let (hits, total) = Self::parse_page(&body)?;
            let fetched = hits.len();
            candidates.extend(hits);

            if fetched == 0 || page * PAGE_SIZE >= total {
                break;
            }
            page += 1;
        }

        let fetched = candidates.len();
        let mut records: Vec<SourceRecord> = candidates
            .into_iter()
            .filter(|(_, names)| any_author_matches(names.as_slice(), query.authors.as_slice()))
            .map(|(record, _)| record)
            .take(query.max_results)
            .collect();

        tracing::debug!(
            "Web of Science kept {} of {} records after author matching",
            records.len(),
            fetched
        );

        classify_records(self.classifier.as_ref(), &mut records).await;
        Ok(records)
    }
}
