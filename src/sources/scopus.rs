//! Scopus adapter using the Elsevier Scopus Search API.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::engine::NameParts;
use crate::enrich::{classify_records, Classifier};
use crate::models::{AuthorQuery, Provider, SourceRecord, SourceRecordBuilder};
use crate::sources::{Source, SourceError};
use crate::utils::{fetch_text, with_retry, HttpClient, RetryConfig};

/// Scopus returns at most 25 entries per page on the standard view
const PAGE_SIZE: usize = 25;

/// Scopus source
///
/// Queries `AUTHLASTNAME`/`AUTHFIRST` pairs, paging until the result set or
/// `max_results` is exhausted.
#[derive(Debug, Clone)]
pub struct ScopusSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    inst_token: Option<String>,
    retry: RetryConfig,
    classifier: Arc<dyn Classifier>,
}

impl ScopusSource {
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
            inst_token: None,
            retry,
            classifier,
        }
    }

    /// Attach an institutional token for off-campus entitlement
    pub fn with_inst_token(mut self, token: Option<String>) -> Self {
        self.inst_token = token;
        self
    }

    /// Build the Scopus advanced-search expression
    fn build_query(query: &AuthorQuery) -> String {
        let clauses: Vec<String> = query
            .authors
            .iter()
            .filter_map(|name| NameParts::from_full_name(name))
            .map(|parts| match parts.first {
                Some(first) => format!("(AUTHLASTNAME({}) AND AUTHFIRST({}))", parts.last, first),
                None => format!("AUTHLASTNAME({})", parts.last),
            })
            .collect();

        let mut expr = if clauses.len() == 1 {
            clauses[0].clone()
        } else {
            format!("({})", clauses.join(" OR "))
        };

        if let Some(start) = query.range.start_year() {
            expr.push_str(&format!(" AND PUBYEAR > {}", start - 1));
        }
        if let Some(end) = query.range.end_year() {
            expr.push_str(&format!(" AND PUBYEAR < {}", end + 1));
        }

        expr
    }

    fn build_url(&self, expr: &str, start: usize, count: usize) -> String {
        format!(
            "{}/content/search/scopus?query={}&start={}&count={}",
            self.base_url,
            urlencoding::encode(expr),
            start,
            count
        )
    }

    /// Parse one search page into records and the reported total
    fn parse_page(body: &str) -> Result<(Vec<SourceRecord>, usize), SourceError> {
        let json: Value = serde_json::from_str(body)?;
        let results = json
            .get("search-results")
            .ok_or_else(|| SourceError::Parse("missing search-results".to_string()))?;

        let total = str_field(results, "opensearch:totalResults")
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);

        let records = results
            .get("entry")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.get("error").is_none())
                    .map(parse_entry)
                    .collect()
            })
            .unwrap_or_default();

        Ok((records, total))
    }
}

/// Trimmed, non-empty string value of `key`; numeric fields go through `count_field`
fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn count_field(value: &Value, key: &str) -> Option<u32> {
    match value.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn scopus_link(entry: &Value) -> Option<&str> {
    entry
        .get("link")?
        .as_array()?
        .iter()
        .find(|link| link.get("@ref").and_then(Value::as_str) == Some("scopus"))
        .and_then(|link| str_field(link, "@href"))
}

fn entry_authors(entry: &Value) -> String {
    let structured: Vec<&str> = entry
        .get("author")
        .and_then(Value::as_array)
        .map(|authors| {
            authors
                .iter()
                .filter_map(|a| str_field(a, "authname"))
                .collect()
        })
        .unwrap_or_default();

    if structured.is_empty() {
        str_field(entry, "dc:creator").unwrap_or_default().to_string()
    } else {
        structured.join("; ")
    }
}

fn parse_entry(entry: &Value) -> SourceRecord {
    let record_id = str_field(entry, "eid")
        .or_else(|| str_field(entry, "dc:identifier"))
        .unwrap_or_default();

    SourceRecordBuilder::new(
        Provider::Scopus,
        str_field(entry, "dc:title").unwrap_or_default(),
    )
    .record_id(record_id)
    .authors(entry_authors(entry))
    .journal(str_field(entry, "prism:publicationName").unwrap_or_default())
    .publication_date(str_field(entry, "prism:coverDate").unwrap_or_default())
    .citation_count(count_field(entry, "citedby-count").unwrap_or(0))
    .doi(str_field(entry, "prism:doi").unwrap_or_default())
    .url(scopus_link(entry).unwrap_or_default())
    .abstract_text(str_field(entry, "dc:description").unwrap_or_default())
    .build()
}

#[async_trait]
impl Source for ScopusSource {
    fn provider(&self) -> Provider {
        Provider::Scopus
    }

    async fn query(&self, query: &AuthorQuery) -> Result<Vec<SourceRecord>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::Config("Scopus API key is not configured".to_string()))?;

        if query.is_empty() {
            return Ok(Vec::new());
        }

        let expr = Self::build_query(query);
        let mut records = Vec::new();
        let mut start = 0;

        while records.len() < query.max_results {
            let count = PAGE_SIZE.min(query.max_results - records.len());
            let url = self.build_url(&expr, start, count);

            let body = with_retry(self.retry, || {
                let mut request = self
                    .client
                    .get(&url)
                    .header("X-ELS-APIKey", api_key)
                    .header("Accept", "application/json");
                if let Some(token) = &self.inst_token {
                    request = request.header("X-ELS-Insttoken", token);
                }
                fetch_text(request, "Scopus")
            })
            .await?;

            let (page, total) = Self::parse_page(&body)?;
            let fetched = page.len();
            records.extend(page);
            start += count;

            if fetched == 0 || start >= total {
                break;
            }
        }

        records.truncate(query.max_results);
        classify_records(self.classifier.as_ref(), &mut records).await;

        tracing::debug!("Scopus returned {} records", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::KeywordClassifier;
    use crate::models::DateRange;

    const PAGE_JSON: &str = r#"{
      "search-results": {
        "opensearch:totalResults": "2",
        "entry": [
          {
            "eid": "2-s2.0-85100000001",
            "dc:identifier": "SCOPUS_ID:85100000001",
            "dc:title": "Simulation-Based Learning!!",
            "dc:creator": "Lee J.",
            "prism:publicationName": "Nurse Education Today",
            "prism:coverDate": "2021-03-01",
            "prism:doi": "10.1016/j.nedt.2021.104",
            "citedby-count": "12",
            "link": [
              {"@ref": "self", "@href": "https://api.elsevier.com/content/abstract/scopus_id/85100000001"},
              {"@ref": "scopus", "@href": "https://www.scopus.com/inward/record.uri?eid=2-s2.0-85100000001"}
            ]
          },
          {
            "eid": "2-s2.0-85100000002",
            "dc:title": "A scoping review of debriefing",
            "author": [{"authname": "Lee J."}, {"authname": "Park A."}],
            "prism:publicationName": "Clinical Simulation in Nursing",
            "prism:coverDate": "2020-01-01",
            "citedby-count": 3,
            "dc:description": "This scoping review maps debriefing practice."
          }
        ]
      }
    }"#;

    fn source(base_url: &str, api_key: Option<&str>) -> ScopusSource {
        ScopusSource::new(
            HttpClient::new().unwrap(),
            base_url,
            api_key.map(str::to_string),
            RetryConfig::default().max_attempts(1),
            Arc::new(KeywordClassifier),
        )
    }

    #[test]
    fn test_build_query() {
        let query = AuthorQuery::new(["Jordan Lee"]);
        assert_eq!(
            ScopusSource::build_query(&query),
            "(AUTHLASTNAME(lee) AND AUTHFIRST(jordan))"
        );

        let query = AuthorQuery::new(["Jordan Lee", "Park"])
            .range(DateRange::parse(Some("2019"), Some("2021")).unwrap());
        assert_eq!(
            ScopusSource::build_query(&query),
            "((AUTHLASTNAME(lee) AND AUTHFIRST(jordan)) OR AUTHLASTNAME(park)) AND PUBYEAR > 2018 AND PUBYEAR < 2022"
        );
    }

    #[test]
    fn test_parse_page() {
        let (records, total) = ScopusSource::parse_page(PAGE_JSON).unwrap();
        assert_eq!(total, 2);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.record_id.as_deref(), Some("2-s2.0-85100000001"));
        assert_eq!(first.citation_count, 12);
        assert_eq!(first.authors, "Lee J.");
        assert_eq!(first.doi.as_deref(), Some("10.1016/j.nedt.2021.104"));
        assert_eq!(
            first.url.as_deref(),
            Some("https://www.scopus.com/inward/record.uri?eid=2-s2.0-85100000001")
        );

        let second = &records[1];
        assert_eq!(second.citation_count, 3);
        assert_eq!(second.authors, "Lee J.; Park A.");
        assert!(second.doi.is_none());
        assert!(second.url.is_none());
    }

    #[test]
    fn test_parse_empty_result_set() {
        let body = r#"{"search-results": {"opensearch:totalResults": "0",
            "entry": [{"@_fa": "true", "error": "Result set was empty"}]}}"#;
        let (records, total) = ScopusSource::parse_page(body).unwrap();
        assert!(records.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_parse_rejects_unexpected_shape() {
        assert!(matches!(
            ScopusSource::parse_page(r#"{"service-error": {}}"#),
            Err(SourceError::Parse(_))
        ));
    }

    #[test]
    fn test_str_field_only_reads_strings() {
        let entry = serde_json::json!({
            "dc:title": "  Debriefing  ",
            "citedby-count": 12,
            "prism:doi": "   "
        });
        assert_eq!(str_field(&entry, "dc:title"), Some("Debriefing"));
        assert_eq!(str_field(&entry, "citedby-count"), None);
        assert_eq!(str_field(&entry, "prism:doi"), None);
        assert_eq!(str_field(&entry, "missing"), None);
        assert_eq!(count_field(&entry, "citedby-count"), Some(12));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let result = source("http://localhost", None)
            .query(&AuthorQuery::new(["Jordan Lee"]))
            .await;
        assert!(matches!(result, Err(SourceError::Config(_))));
    }

    #[tokio::test]
    async fn test_query_sends_api_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/content/search/scopus")
            .match_query(mockito::Matcher::Any)
            .match_header("X-ELS-APIKey", "els-key")
            .with_status(200)
            .with_body(PAGE_JSON)
            .create_async()
            .await;

        let records = source(&server.url(), Some("els-key"))
            .query(&AuthorQuery::new(["Jordan Lee"]))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[1].classification,
            crate::models::PublicationType::Review
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_key_is_config_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/content/search/scopus")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let result = source(&server.url(), Some("bad"))
            .query(&AuthorQuery::new(["Jordan Lee"]))
            .await;
        assert!(matches!(result, Err(SourceError::Config(_))));
    }
}
