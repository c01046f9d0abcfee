//! Canonical publication produced by the identity resolver.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::record::{Provider, PublicationType, SourceRecord};
use crate::utils::{doi_url, normalize_doi};

/// A deduplicated publication spanning one or more providers
///
/// Maps and sets are ordered so that serializing the same resolution twice
/// yields identical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedPublication {
    pub title: String,

    /// Authors (semicolon-separated), from the first contributing record
    pub authors: String,

    pub journal: String,

    pub publication_date: String,

    /// Highest citation count reported by any contributing provider
    pub citation_count: u32,

    /// Normalized DOI
    pub doi: Option<String>,

    /// Canonical link: DOI resolver link when a DOI is known
    pub url: Option<String>,

    pub r#abstract: String,

    pub classification: PublicationType,

    /// Provider shown as the record's origin
    pub source: Provider,

    /// Every provider that contributed
    pub sources: BTreeSet<Provider>,

    /// Deep link per contributing provider
    pub source_urls: BTreeMap<Provider, String>,

    /// Provider-native identifier per contributing provider
    pub source_ids: BTreeMap<Provider, String>,

    /// Field-normalized citation rate (e.g. NIH iCite RCR)
    pub relative_citation_ratio: Option<f64>,
}

impl MergedPublication {
    /// Start a canonical record from the first record seen under a merge key
    pub fn from_record(record: SourceRecord) -> Self {
        let doi = record.doi.as_deref().and_then(normalize_doi);
        let url = match &doi {
            Some(doi) => Some(doi_url(doi)),
            None => record.url.clone(),
        };

        let mut sources = BTreeSet::new();
        sources.insert(record.provider);

        let mut source_urls = BTreeMap::new();
        if let Some(link) = &record.url {
            source_urls.insert(record.provider, link.clone());
        }

        let mut source_ids = BTreeMap::new();
        if let Some(id) = &record.record_id {
            source_ids.insert(record.provider, id.clone());
        }

        Self {
            title: record.title,
            authors: record.authors,
            journal: record.journal,
            publication_date: record.publication_date,
            citation_count: record.citation_count,
            doi,
            url,
            r#abstract: record.r#abstract,
            classification: record.classification,
            source: record.provider,
            sources,
            source_urls,
            source_ids,
            relative_citation_ratio: record.relative_citation_ratio,
        }
    }

    /// Fold another record of the same publication into this one
    ///
    /// Descriptive fields are first-writer-wins; only provenance, DOI, link,
    /// citation count and citation rate are combined.
    pub fn absorb(&mut self, record: &SourceRecord) {
        self.sources.insert(record.provider);
        if let Some(link) = &record.url {
            self.source_urls.insert(record.provider, link.clone());
        }
        if let Some(id) = &record.record_id {
            self.source_ids.insert(record.provider, id.clone());
        }

        if self.doi.is_none() {
            self.doi = record.doi.as_deref().and_then(normalize_doi);
        }

        self.url = match &self.doi {
            Some(doi) => Some(doi_url(doi)),
            None => self
                .url
                .clone()
                .filter(|u| !u.is_empty())
                .or_else(|| record.url.clone()),
        };

        self.citation_count = self.citation_count.max(record.citation_count);

        if self.relative_citation_ratio.is_none() {
            self.relative_citation_ratio = record.relative_citation_ratio;
        }

        if let Some(primary) = Provider::DISPLAY_PRIORITY
            .into_iter()
            .find(|p| self.sources.contains(p))
        {
            self.source = primary;
        }
    }

    /// PubMed identifier, when PubMed contributed to this record
    pub fn pmid(&self) -> Option<&str> {
        self.source_ids.get(&Provider::PubMed).map(String::as_str)
    }

    /// Whether the given provider contributed to this record
    pub fn has_source(&self, provider: Provider) -> bool {
        self.sources.contains(&provider)
    }

    /// Publication year, when the date starts with one
    pub fn year(&self) -> Option<i32> {
        self.publication_date.get(..4).and_then(|y| y.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceRecordBuilder;

    #[test]
    fn test_from_record_prefers_doi_link() {
        let record = SourceRecordBuilder::new(Provider::Scopus, "Paper")
            .doi(" 10.1000/ABC ")
            .url("https://www.scopus.com/record/1")
            .build();

        let merged = MergedPublication::from_record(record);

        assert_eq!(merged.doi.as_deref(), Some("10.1000/abc"));
        assert_eq!(merged.url.as_deref(), Some("https://doi.org/10.1000/abc"));
        assert_eq!(
            merged.source_urls.get(&Provider::Scopus).map(String::as_str),
            Some("https://www.scopus.com/record/1")
        );
    }

    #[test]
    fn test_absorb_keeps_first_writer_fields() {
        let first = SourceRecordBuilder::new(Provider::WebOfScience, "Original title")
            .journal("Journal A")
            .citation_count(5)
            .build();
        let second = SourceRecordBuilder::new(Provider::PubMed, "Original Title")
            .journal("Journal B")
            .abstract_text("Some abstract")
            .citation_count(12)
            .record_id("31415926")
            .doi("10.1/x")
            .build();

        let mut merged = MergedPublication::from_record(first);
        merged.absorb(&second);

        assert_eq!(merged.title, "Original title");
        assert_eq!(merged.journal, "Journal A");
        assert_eq!(merged.r#abstract, "");
        assert_eq!(merged.citation_count, 12);
        assert_eq!(merged.doi.as_deref(), Some("10.1/x"));
        assert_eq!(merged.pmid(), Some("31415926"));
        assert_eq!(merged.source, Provider::WebOfScience);
    }

    #[test]
    fn test_display_source_follows_priority() {
        let scopus = SourceRecordBuilder::new(Provider::Scopus, "T").build();
        let pubmed = SourceRecordBuilder::new(Provider::PubMed, "T").build();

        let mut merged = MergedPublication::from_record(scopus);
        assert_eq!(merged.source, Provider::Scopus);

        merged.absorb(&pubmed);
        assert_eq!(merged.source, Provider::PubMed);
        assert_eq!(merged.sources.len(), 2);
    }

    #[test]
    fn test_url_falls_back_to_first_known_link() {
        let first = SourceRecordBuilder::new(Provider::Scopus, "T").build();
        let second = SourceRecordBuilder::new(Provider::PubMed, "T")
            .url("https://pubmed.ncbi.nlm.nih.gov/1/")
            .build();

        let mut merged = MergedPublication::from_record(first);
        assert!(merged.url.is_none());

        merged.absorb(&second);
        assert_eq!(merged.url.as_deref(), Some("https://pubmed.ncbi.nlm.nih.gov/1/"));
    }

    #[test]
    fn test_year() {
        let record = SourceRecordBuilder::new(Provider::PubMed, "T")
            .publication_date("2019-05-02")
            .build();
        assert_eq!(MergedPublication::from_record(record).year(), Some(2019));
    }
}
