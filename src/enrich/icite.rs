//! Relative citation ratio lookup (NIH iCite) and batched enrichment.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{MergedPublication, Provider};
use crate::sources::SourceError;
use crate::utils::{fetch_text, with_retry, HttpClient, RetryConfig};

/// Maximum identifiers per iCite request
pub const ICITE_BATCH_SIZE: usize = 200;

/// Looks up citation rates for a batch of identifiers
#[async_trait]
pub trait CitationRateLookup: Send + Sync + std::fmt::Debug {
    async fn lookup(&self, ids: &[String]) -> Result<HashMap<String, f64>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct ICiteResponse {
    #[serde(default)]
    data: Vec<ICitePub>,
}

#[derive(Debug, Deserialize)]
struct ICitePub {
    pmid: serde_json::Value,
    #[serde(default)]
    relative_citation_ratio: Option<f64>,
}

/// iCite client: `GET {base}/pubs?pmids=1,2,3`
#[derive(Debug, Clone)]
pub struct ICiteClient {
    client: HttpClient,
    base_url: String,
    retry: RetryConfig,
}

impl ICiteClient {
    pub fn new(client: HttpClient, base_url: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    fn parse_response(body: &str) -> Result<HashMap<String, f64>, SourceError> {
        let response: ICiteResponse = serde_json::from_str(body)?;

        Ok(response
            .data
            .into_iter()
            .filter_map(|item| {
                let pmid = match item.pmid {
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::String(s) => s,
                    _ => return None,
                };
                item.relative_citation_ratio.map(|rcr| (pmid, rcr))
            })
            .collect())
    }
}

#[async_trait]
impl CitationRateLookup for ICiteClient {
    async fn lookup(&self, ids: &[String]) -> Result<HashMap<String, f64>, SourceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/pubs?pmids={}", self.base_url, ids.join(","));
        let body = with_retry(self.retry, || fetch_text(self.client.get(&url), "iCite")).await?;

        Self::parse_response(&body)
    }
}

/// Attach citation rates to PubMed-backed publications that lack one
///
/// Identifiers are sent in chunks of `batch_size`. A failed chunk is logged and
/// skipped; the remaining chunks still run. Returns the number of publications
/// that received a rate.
pub async fn enrich_citation_rates(
    publications: &mut [MergedPublication],
    lookup: &dyn CitationRateLookup,
    batch_size: usize,
) -> usize {
    let pmids: Vec<String> = publications
        .iter()
        .filter(|p| p.has_source(Provider::PubMed) && p.relative_citation_ratio.is_none())
        .filter_map(|p| p.pmid().map(str::to_string))
        .collect();

    if pmids.is_empty() {
        return 0;
    }

    let mut rates = HashMap::new();
    for (index, chunk) in pmids.chunks(batch_size.max(1)).enumerate() {
        match lookup.lookup(chunk).await {
            Ok(batch) => rates.extend(batch),
            Err(e) => {
                tracing::warn!(
                    "Citation-rate batch {} ({} ids) failed: {}",
                    index + 1,
                    chunk.len(),
                    e
                );
            }
        }
    }

    let mut enriched = 0;
    for publication in publications.iter_mut() {
        if publication.relative_citation_ratio.is_some() {
            continue;
        }
        if let Some(rate) = publication.pmid().and_then(|id| rates.get(id)) {
            publication.relative_citation_ratio = Some(*rate);
            enriched += 1;
        }
    }

    tracing::debug!("Attached citation rates to {} publications", enriched);
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceRecordBuilder;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingLookup {
        batches: Mutex<Vec<Vec<String>>>,
        fail_batch: Option<usize>,
    }

    #[async_trait]
    impl CitationRateLookup for RecordingLookup {
        async fn lookup(&self, ids: &[String]) -> Result<HashMap<String, f64>, SourceError> {
            let mut batches = self.batches.lock().unwrap();
            batches.push(ids.to_vec());
            if Some(batches.len()) == self.fail_batch {
                return Err(SourceError::Network("boom".to_string()));
            }
            Ok(ids.iter().map(|id| (id.clone(), 1.5)).collect())
        }
    }

    fn pubmed_publication(pmid: &str) -> MergedPublication {
        MergedPublication::from_record(
            SourceRecordBuilder::new(Provider::PubMed, format!("Paper {}", pmid))
                .record_id(pmid)
                .build(),
        )
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"meta": {}, "data": [
            {"pmid": 123, "relative_citation_ratio": 2.1},
            {"pmid": "456", "relative_citation_ratio": null},
            {"pmid": 789, "relative_citation_ratio": 0.4}
        ]}"#;

        let rates = ICiteClient::parse_response(body).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates.get("123"), Some(&2.1));
        assert_eq!(rates.get("789"), Some(&0.4));
    }

    #[tokio::test]
    async fn test_enrich_batches_by_chunk_size() {
        let mut pubs: Vec<_> = (0..450).map(|i| pubmed_publication(&i.to_string())).collect();
        let lookup = RecordingLookup::default();

        let enriched = enrich_citation_rates(&mut pubs, &lookup, ICITE_BATCH_SIZE).await;

        let sizes: Vec<usize> = lookup.batches.lock().unwrap().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![200, 200, 50]);
        assert_eq!(enriched, 450);
        assert!(pubs.iter().all(|p| p.relative_citation_ratio == Some(1.5)));
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_abort_others() {
        let mut pubs: Vec<_> = (0..5).map(|i| pubmed_publication(&i.to_string())).collect();
        let lookup = RecordingLookup {
            fail_batch: Some(1),
            ..Default::default()
        };

        let enriched = enrich_citation_rates(&mut pubs, &lookup, 2).await;

        assert_eq!(lookup.batches.lock().unwrap().len(), 3);
        assert_eq!(enriched, 3);
        assert!(pubs[0].relative_citation_ratio.is_none());
        assert!(pubs[1].relative_citation_ratio.is_none());
        assert_eq!(pubs[4].relative_citation_ratio, Some(1.5));
    }

    #[tokio::test]
    async fn test_only_pubmed_records_are_looked_up() {
        let scopus = MergedPublication::from_record(
            SourceRecordBuilder::new(Provider::Scopus, "Scopus only")
                .record_id("2-s2.0-1")
                .build(),
        );
        let mut existing = pubmed_publication("99");
        existing.relative_citation_ratio = Some(3.0);
        let mut pubs = vec![scopus, existing, pubmed_publication("7")];
        let lookup = RecordingLookup::default();

        enrich_citation_rates(&mut pubs, &lookup, ICITE_BATCH_SIZE).await;

        assert_eq!(*lookup.batches.lock().unwrap(), vec![vec!["7".to_string()]]);
        assert!(pubs[0].relative_citation_ratio.is_none());
        assert_eq!(pubs[1].relative_citation_ratio, Some(3.0));
    }

    #[tokio::test]
    async fn test_icite_client_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/pubs")
            .match_query(mockito::Matcher::UrlEncoded("pmids".into(), "11,22".into()))
            .with_status(200)
            .with_body(r#"{"data": [{"pmid": 11, "relative_citation_ratio": 1.25}]}"#)
            .create_async()
            .await;

        let client = ICiteClient::new(HttpClient::new().unwrap(), server.url(), RetryConfig::default());
        let rates = client
            .lookup(&["11".to_string(), "22".to_string()])
            .await
            .unwrap();

        assert_eq!(rates.get("11"), Some(&1.25));
        assert!(!rates.contains_key("22"));
        mock.assert_async().await;
    }
}
