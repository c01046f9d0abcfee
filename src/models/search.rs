//! Author query and resolution response models.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::publication::MergedPublication;

/// Errors from parsing date bounds
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateRangeError {
    #[error("invalid year: {0}")]
    InvalidYear(String),

    #[error("invalid date '{0}': expected YYYY or YYYY-MM-DD")]
    InvalidDate(String),

    #[error("start date {start} is after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// Inclusive publication-date bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Parse optional bounds given as `YYYY` or `YYYY-MM-DD`
    ///
    /// A bare start year means January 1st, a bare end year December 31st.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, DateRangeError> {
        let start = start
            .map(|s| parse_bound(s, true))
            .transpose()?;
        let end = end.map(|s| parse_bound(s, false)).transpose()?;

        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(DateRangeError::Inverted { start: s, end: e });
            }
        }

        Ok(Self { start, end })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn start_year(&self) -> Option<i32> {
        self.start.map(|d| d.year())
    }

    pub fn end_year(&self) -> Option<i32> {
        self.end.map(|d| d.year())
    }
}

fn parse_bound(value: &str, is_start: bool) -> Result<NaiveDate, DateRangeError> {
    let value = value.trim();
    if value.len() == 4 {
        let year: i32 = value
            .parse()
            .map_err(|_| DateRangeError::InvalidYear(value.to_string()))?;
        let (month, day) = if is_start { (1, 1) } else { (12, 31) };
        return NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| DateRangeError::InvalidYear(value.to_string()));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| DateRangeError::InvalidDate(value.to_string()))
}

/// A request for the publications of one or more authors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorQuery {
    /// Target full names ("First Last")
    pub authors: Vec<String>,

    pub range: DateRange,

    /// Upper bound on records fetched from each provider
    pub max_results: usize,
}

impl AuthorQuery {
    /// Build a query, dropping blank names
    pub fn new<I, S>(authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            authors: authors
                .into_iter()
                .map(|a| a.as_ref().trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            range: DateRange::default(),
            max_results: 100,
        }
    }

    pub fn range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}

/// Summary bibliometrics over a resolved publication set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bibliometrics {
    pub publication_count: usize,
    pub total_citations: u64,
    pub impact_index: usize,
    pub weighted_citation_rate_sum: f64,
}

/// Final result of one resolution request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub publications: Vec<MergedPublication>,

    /// Per-provider failures, or a single informational notice
    pub errors: Vec<String>,

    pub metrics: Bibliometrics,
}

impl ResolveResponse {
    pub fn is_partial(&self) -> bool {
        !self.publications.is_empty() && !self.errors.is_empty()
    }
}
