//! PubMed adapter using the NCBI E-utilities API.

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::sync::Arc;

use crate::enrich::{classify_records, Classifier};
use crate::models::{AuthorQuery, Provider, SourceRecord, SourceRecordBuilder};
use crate::sources::{Source, SourceError};
use crate::utils::{fetch_text, with_retry, HttpClient, RetryConfig};

const PUBMED_ARTICLE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// PubMed source
///
/// Searches with `esearch` on the `[Author]` field, then fetches full records
/// with `efetch`. PubMed reports no citation counts, so records carry 0.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    retry: RetryConfig,
    classifier: Arc<dyn Classifier>,
}

impl PubMedSource {
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

    /// Build the `term` parameter: one quoted `[Author]` clause per name
    fn build_term(query: &AuthorQuery) -> String {
        let clauses: Vec<String> = query
            .authors
            .iter()
            .map(|name| format!("\"{}\"[Author]", name.replace('"', "")))
            .collect();

        if clauses.len() == 1 {
            clauses[0].clone()
        } else {
            format!("({})", clauses.join(" OR "))
        }
    }

    /// Build the esearch query string
    fn build_search_params(&self, query: &AuthorQuery) -> String {
        let mut params = vec![
            ("db".to_string(), "pubmed".to_string()),
            ("term".to_string(), Self::build_term(query)),
            ("retmax".to_string(), query.max_results.to_string()),
            ("retmode".to_string(), "xml".to_string()),
        ];

        // E-utilities needs both bounds once either is given
        if !query.range.is_unbounded() {
            let min = query
                .range
                .start
                .map(|d| d.format("%Y/%m/%d").to_string())
                .unwrap_or_else(|| "1800/01/01".to_string());
            let max = query
                .range
                .end
                .map(|d| d.format("%Y/%m/%d").to_string())
                .unwrap_or_else(|| "3000/12/31".to_string());
            params.push(("datetype".to_string(), "pdat".to_string()));
            params.push(("mindate".to_string(), min));
            params.push(("maxdate".to_string(), max));
        }

        if let Some(key) = &self.api_key {
            params.push(("api_key".to_string(), key.clone()));
        }

        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn build_fetch_url(&self, ids: &[String]) -> String {
        let mut url = format!(
            "{}/efetch.fcgi?db=pubmed&id={}&retmode=xml",
            self.base_url,
            ids.join(",")
        );
        if let Some(key) = &self.api_key {
            url.push_str(&format!("&api_key={}", urlencoding::encode(key)));
        }
        url
    }

    /// Parse an esearch response into PMIDs
    fn parse_search_response(xml: &str) -> Result<Vec<String>, SourceError> {
        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct ESearchResult {
            IdList: Option<IdList>,
            ERROR: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        struct IdList {
            #[serde(rename = "Id", default)]
            ids: Vec<String>,
        }

        let result: ESearchResult = from_str(xml)
            .map_err(|e| SourceError::Parse(format!("Failed to parse PubMed search XML: {}", e)))?;

        match (result.IdList, result.ERROR) {
            (Some(list), _) => Ok(list.ids),
            (None, Some(error)) => Err(SourceError::Api(format!("PubMed search error: {}", error))),
            (None, None) => Ok(Vec::new()),
        }
    }

    /// Parse an efetch response into records
    fn parse_fetch_response(xml: &str) -> Result<Vec<SourceRecord>, SourceError> {
        #[derive(Debug, Deserialize)]
        struct PubmedArticleSet {
            #[serde(rename = "PubmedArticle", default)]
            articles: Vec<PubmedArticle>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct PubmedArticle {
            MedlineCitation: Option<MedlineCitation>,
            PubmedData: Option<PubmedData>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct MedlineCitation {
            PMID: Option<Text>,
            Article: Option<Article>,
        }

        #[derive(Debug, Deserialize)]
        struct Text {
            #[serde(rename = "$text", default)]
            value: String,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct Article {
            Journal: Option<Journal>,
            ArticleTitle: Option<Text>,
            Abstract: Option<Abstract>,
            AuthorList: Option<AuthorList>,
            #[serde(default)]
            ELocationID: Vec<IdWithType>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct Journal {
            Title: Option<String>,
            JournalIssue: Option<JournalIssue>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct JournalIssue {
            PubDate: Option<PubDate>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct PubDate {
            Year: Option<String>,
            Month: Option<String>,
            Day: Option<String>,
            MedlineDate: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        struct Abstract {
            #[serde(rename = "AbstractText", default)]
            texts: Vec<Text>,
        }

        #[derive(Debug, Deserialize)]
        struct AuthorList {
            #[serde(rename = "Author", default)]
            authors: Vec<Author>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct Author {
            LastName: Option<String>,
            ForeName: Option<String>,
            Initials: Option<String>,
            CollectiveName: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct PubmedData {
            ArticleIdList: Option<ArticleIdList>,
        }

        #[derive(Debug, Deserialize)]
        struct ArticleIdList {
            #[serde(rename = "ArticleId", default)]
            ids: Vec<IdWithType>,
        }

        #[derive(Debug, Deserialize)]
        struct IdWithType {
            #[serde(rename = "@IdType", alias = "@EIdType", default)]
            id_type: String,
            #[serde(rename = "$text", default)]
            value: String,
        }

        let result: PubmedArticleSet = from_str(xml)
            .map_err(|e| SourceError::Parse(format!("Failed to parse PubMed fetch XML: {}", e)))?;

        let mut records = Vec::with_capacity(result.articles.len());

        for article in result.articles {
            let citation = article.MedlineCitation.as_ref();
            let pmid = citation
                .and_then(|m| m.PMID.as_ref())
                .map(|p| p.value.trim().to_string())
                .unwrap_or_default();
            let details = citation.and_then(|m| m.Article.as_ref());

            let title = details
                .and_then(|a| a.ArticleTitle.as_ref())
                .map(|t| t.value.trim().trim_end_matches('.').to_string())
                .unwrap_or_default();

            let authors = details
                .and_then(|a| a.AuthorList.as_ref())
                .map(|list| {
                    list.authors
                        .iter()
                        .filter_map(|author| {
                            if let Some(collective) = &author.CollectiveName {
                                return Some(collective.trim().to_string());
                            }
                            let last = author.LastName.as_deref()?.trim();
                            let given = author
                                .ForeName
                                .as_deref()
                                .or(author.Initials.as_deref())
                                .unwrap_or("")
                                .trim();
                            Some(if given.is_empty() {
                                last.to_string()
                            } else {
                                format!("{}, {}", last, given)
                            })
                        })
                        .collect::<Vec<_>>()
                        .join("; ")
                })
                .unwrap_or_default();

            let abstract_text = details
                .and_then(|a| a.Abstract.as_ref())
                .map(|ab| {
                    ab.texts
                        .iter()
                        .map(|t| t.value.trim())
                        .filter(|t| !t.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();

            let journal = details
                .and_then(|a| a.Journal.as_ref())
                .and_then(|j| j.Title.clone())
                .unwrap_or_default();

            let publication_date = details
                .and_then(|a| a.Journal.as_ref())
                .and_then(|j| j.JournalIssue.as_ref())
                .and_then(|ji| ji.PubDate.as_ref())
                .map(|pd| match (&pd.Year, &pd.MedlineDate) {
                    (Some(year), _) => format_pub_date(year, pd.Month.as_deref(), pd.Day.as_deref()),
                    (None, Some(medline)) => medline.clone(),
                    (None, None) => String::new(),
                })
                .unwrap_or_default();

            let doi = article
                .PubmedData
                .as_ref()
                .and_then(|pd| pd.ArticleIdList.as_ref())
                .and_then(|list| list.ids.iter().find(|id| id.id_type == "doi"))
                .or_else(|| {
                    details.and_then(|a| a.ELocationID.iter().find(|id| id.id_type == "doi"))
                })
                .map(|id| id.value.clone())
                .unwrap_or_default();

            let url = if pmid.is_empty() {
                String::new()
            } else {
                format!("{}/{}/", PUBMED_ARTICLE_URL, pmid)
            };

            records.push(
                SourceRecordBuilder::new(Provider::PubMed, title)
                    .record_id(pmid)
                    .authors(authors)
                    .journal(journal)
                    .publication_date(publication_date)
                    .abstract_text(abstract_text)
                    .doi(doi)
                    .url(url)
                    .build(),
            );
        }

        Ok(records)
    }
}

/// Render a PubMed PubDate as ISO-ish text: `2021`, `2021-03` or `2021-03-05`
fn format_pub_date(year: &str, month: Option<&str>, day: Option<&str>) -> String {
    let Some(month) = month.and_then(month_number) else {
        return year.to_string();
    };
    match day.and_then(|d| d.trim().parse::<u32>().ok()) {
        Some(day) => format!("{}-{:02}-{:02}", year, month, day),
        None => format!("{}-{:02}", year, month),
    }
}

fn month_number(month: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let month = month.trim();
    if let Ok(n) = month.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let prefix = month.get(..3)?.to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

#[async_trait]
impl Source for PubMedSource {
    fn provider(&self) -> Provider {
        Provider::PubMed
    }

    async fn query(&self, query: &AuthorQuery) -> Result<Vec<SourceRecord>, SourceError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let search_url = format!(
            "{}/esearch.fcgi?{}",
            self.base_url,
            self.build_search_params(query)
        );
        let xml = with_retry(self.retry, || fetch_text(self.client.get(&search_url), "PubMed")).await?;

        let ids = Self::parse_search_response(&xml)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let fetch_url = self.build_fetch_url(&ids);
        let xml = with_retry(self.retry, || fetch_text(self.client.get(&fetch_url), "PubMed")).await?;

        let mut records = Self::parse_fetch_response(&xml)?;
        classify_records(self.classifier.as_ref(), &mut records).await;

        tracing::debug!("PubMed returned {} records", records.len());
        Ok(records)
    }
}
