//! Provider tags and the normalized per-provider publication record.

use serde::{Deserialize, Serialize};

/// Title used when a provider returns a record without one
pub const UNTITLED: &str = "Untitled publication";

/// The bibliographic provider a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    WebOfScience,
    Scopus,
    PubMed,
}

impl Provider {
    /// Order in which provider record lists are folded into the resolver
    pub const FOLD_ORDER: [Provider; 3] = [Provider::WebOfScience, Provider::Scopus, Provider::PubMed];

    /// Order used to pick the displayed provider of a merged record
    pub const DISPLAY_PRIORITY: [Provider; 3] =
        [Provider::WebOfScience, Provider::PubMed, Provider::Scopus];

    /// Returns the display name of the provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::WebOfScience => "Web of Science",
            Provider::Scopus => "Scopus",
            Provider::PubMed => "PubMed",
        }
    }

    /// Returns the provider identifier (config keys, JSON output)
    pub fn id(&self) -> &'static str {
        match self {
            Provider::WebOfScience => "web_of_science",
            Provider::Scopus => "scopus",
            Provider::PubMed => "pubmed",
        }
    }

    /// Look up a provider by its identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Provider::FOLD_ORDER
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(id.trim()))
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Coarse publication type derived from the abstract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationType {
    #[default]
    PrimaryResearch,
    Review,
}

impl PublicationType {
    pub fn label(&self) -> &'static str {
        match self {
            PublicationType::PrimaryResearch => "Primary research",
            PublicationType::Review => "Review",
        }
    }

    /// Parse a classifier label, accepting the common spellings
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "review" => Some(PublicationType::Review),
            "primary_research" | "primary" | "research" => Some(PublicationType::PrimaryResearch),
            _ => None,
        }
    }
}

impl std::fmt::Display for PublicationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One provider's normalized view of a publication
///
/// Adapters translate their provider-specific payloads into this shape; the
/// engine never sees anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Provider that produced the record
    pub provider: Provider,

    /// Provider-native identifier (WoS UID, Scopus EID, PMID)
    pub record_id: Option<String>,

    /// Publication title, [`UNTITLED`] when the provider had none
    pub title: String,

    /// Authors as one formatted string (semicolon-separated)
    pub authors: String,

    /// Journal or source title
    pub journal: String,

    /// Publication date as reported (year-only or ISO date)
    pub publication_date: String,

    /// Citation count, 0 when unknown
    pub citation_count: u32,

    /// Digital Object Identifier, as reported
    pub doi: Option<String>,

    /// Deep link into the provider
    pub url: Option<String>,

    /// Abstract text, may be empty
    pub r#abstract: String,

    /// Publication type computed from the abstract
    pub classification: PublicationType,

    /// Field-normalized citation rate, when the provider supplies one
    pub relative_citation_ratio: Option<f64>,
}

impl SourceRecord {
    /// Create a record with a title and defaults for everything else
    pub fn new(provider: Provider, title: impl Into<String>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            title.trim().to_string()
        };

        Self {
            provider,
            record_id: None,
            title,
            authors: String::new(),
            journal: String::new(),
            publication_date: String::new(),
            citation_count: 0,
            doi: None,
            url: None,
            r#abstract: String::new(),
            classification: PublicationType::default(),
            relative_citation_ratio: None,
        }
    }

    /// Returns the author names as a vector
    pub fn author_list(&self) -> Vec<&str> {
        self.authors
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Builder for constructing SourceRecord objects
#[derive(Debug, Clone)]
pub struct SourceRecordBuilder {
    record: SourceRecord,
}

impl SourceRecordBuilder {
    pub fn new(provider: Provider, title: impl Into<String>) -> Self {
        Self {
            record: SourceRecord::new(provider, title),
        }
    }

    pub fn record_id(mut self, id: impl Into<String>) -> Self {
        self.record.record_id = non_empty(id.into());
        self
    }

    pub fn authors(mut self, authors: impl Into<String>) -> Self {
        self.record.authors = authors.into();
        self
    }

    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.record.journal = journal.into();
        self
    }

    pub fn publication_date(mut self, date: impl Into<String>) -> Self {
        self.record.publication_date = date.into();
        self
    }

    pub fn citation_count(mut self, count: u32) -> Self {
        self.record.citation_count = count;
        self
    }

    /// Set DOI; blank values are ignored
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.record.doi = non_empty(doi.into());
        self
    }

    /// Set the provider deep link; blank values are ignored
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.record.url = non_empty(url.into());
        self
    }

    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.record.r#abstract = text.into();
        self
    }

    pub fn classification(mut self, classification: PublicationType) -> Self {
        self.record.classification = classification;
        self
    }

    pub fn relative_citation_ratio(mut self, rcr: f64) -> Self {
        self.record.relative_citation_ratio = Some(rcr);
        self
    }

    pub fn build(self) -> SourceRecord {
        self.record
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = SourceRecordBuilder::new(Provider::Scopus, "Simulation in nursing")
            .record_id("2-s2.0-85100000000")
            .authors("Lee J.; Smith A.")
            .journal("Nurse Education Today")
            .publication_date("2021-03-01")
            .citation_count(7)
            .doi("10.1016/j.nedt.2021.104")
            .url("https://www.scopus.com/record/1")
            .build();

        assert_eq!(record.provider, Provider::Scopus);
        assert_eq!(record.citation_count, 7);
        assert_eq!(record.doi.as_deref(), Some("10.1016/j.nedt.2021.104"));
        assert_eq!(record.author_list(), vec!["Lee J.", "Smith A."]);
    }

    #[test]
    fn test_blank_fields_become_none() {
        let record = SourceRecordBuilder::new(Provider::PubMed, "   ")
            .doi("  ")
            .url("")
            .build();

        assert_eq!(record.title, UNTITLED);
        assert!(record.doi.is_none());
        assert!(record.url.is_none());
    }

    #[test]
    fn test_provider_ids() {
        for provider in Provider::FOLD_ORDER {
            assert_eq!(Provider::from_id(provider.id()), Some(provider));
        }
        assert_eq!(Provider::from_id("PubMed"), Some(Provider::PubMed));
        assert_eq!(Provider::from_id("arxiv"), None);
        assert_eq!(Provider::WebOfScience.to_string(), "Web of Science");
    }

    #[test]
    fn test_publication_type_labels() {
        assert_eq!(PublicationType::from_label("Review"), Some(PublicationType::Review));
        assert_eq!(
            PublicationType::from_label("primary-research"),
            Some(PublicationType::PrimaryResearch)
        );
        assert_eq!(PublicationType::from_label("editorial"), None);
    }
}
