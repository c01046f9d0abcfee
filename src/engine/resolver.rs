//! Identity resolution: fold per-provider records into canonical publications.

use std::collections::{BTreeMap, HashMap};

use crate::models::{MergedPublication, Provider, SourceRecord, UNTITLED};
use crate::utils::{normalize_doi, normalize_title};

/// Identity of a record for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MergeKey {
    Doi(String),
    Title(String),
}

impl MergeKey {
    /// DOI first, normalized title second; `None` when neither is usable
    pub fn of(record: &SourceRecord) -> Option<Self> {
        if let Some(doi) = record.doi.as_deref().and_then(normalize_doi) {
            return Some(MergeKey::Doi(doi));
        }
        title_key(&record.title).map(MergeKey::Title)
    }
}

/// The placeholder title never identifies a publication
fn title_key(title: &str) -> Option<String> {
    if title == UNTITLED {
        return None;
    }
    normalize_title(title)
}

/// Outcome of one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub publications: Vec<MergedPublication>,
    /// Records dropped because they had neither a DOI nor a usable title
    pub dropped: usize,
}

/// Merge per-provider record lists into canonical publications
///
/// Lists are folded in [`Provider::FOLD_ORDER`]; within a list, input order is
/// kept. Output is in first-seen order. The pass is pure: the same input
/// always yields the same output.
pub fn merge(lists: &BTreeMap<Provider, Vec<SourceRecord>>) -> Resolution {
    let ordered = Provider::FOLD_ORDER
        .iter()
        .filter_map(|provider| lists.get(provider))
        .flatten();
    merge_records(ordered)
}

/// Merge records in the order given
///
/// A DOI-keyed record only ever joins a DOI-keyed publication and a
/// title-keyed record only ever joins a title-keyed one.
pub fn merge_records<'a, I>(records: I) -> Resolution
where
    I: IntoIterator<Item = &'a SourceRecord>,
{
    let mut publications: Vec<MergedPublication> = Vec::new();
    let mut by_doi: HashMap<String, usize> = HashMap::new();
    let mut by_title: HashMap<String, usize> = HashMap::new();
    let mut dropped = 0;

    for record in records {
        let Some(key) = MergeKey::of(record) else {
            dropped += 1;
            continue;
        };

        let existing = match &key {
            MergeKey::Doi(doi) => by_doi.get(doi).copied(),
            MergeKey::Title(title) => by_title.get(title).copied(),
        };

        let index = match existing {
            Some(index) => {
                publications[index].absorb(record);
                index
            }
            None => {
                publications.push(MergedPublication::from_record(record.clone()));
                publications.len() - 1
            }
        };

        match key {
            MergeKey::Doi(doi) => {
                by_doi.entry(doi).or_insert(index);
            }
            MergeKey::Title(title) => {
                by_title.entry(title).or_insert(index);
            }
        }
    }

    if dropped > 0 {
        tracing::debug!("Dropped {} records without DOI or title", dropped);
    }

    Resolution {
        publications,
        dropped,
    }
}
