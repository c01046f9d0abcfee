//! Bibliometric summaries over a resolved publication set.

use crate::models::{Bibliometrics, MergedPublication};

/// Largest `h` such that `h` publications each have at least `h` citations
///
/// Computed over deduplicated publications, so a paper indexed by several
/// providers counts once with its highest citation count.
pub fn impact_index(publications: &[MergedPublication]) -> usize {
    let mut counts: Vec<u32> = publications.iter().map(|p| p.citation_count).collect();
    counts.sort_by(|a, b| b.cmp(a));

    counts
        .iter()
        .enumerate()
        .take_while(|(rank, &count)| count as usize > *rank)
        .count()
}

/// Sum of field-normalized citation rates; unknown rates count as zero
pub fn weighted_citation_rate_sum(publications: &[MergedPublication]) -> f64 {
    publications
        .iter()
        .filter_map(|p| p.relative_citation_ratio)
        .sum()
}

pub fn summarize(publications: &[MergedPublication]) -> Bibliometrics {
    Bibliometrics {
        publication_count: publications.len(),
        total_citations: publications.iter().map(|p| u64::from(p.citation_count)).sum(),
        impact_index: impact_index(publications),
        weighted_citation_rate_sum: weighted_citation_rate_sum(publications),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provider, SourceRecordBuilder};

    fn publication(citations: u32, rate: Option<f64>) -> MergedPublication {
        let mut builder = SourceRecordBuilder::new(Provider::PubMed, format!("Paper {}", citations))
            .citation_count(citations);
        if let Some(rate) = rate {
            builder = builder.relative_citation_ratio(rate);
        }
        MergedPublication::from_record(builder.build())
    }

    fn with_citations(counts: &[u32]) -> Vec<MergedPublication> {
        counts.iter().map(|&c| publication(c, None)).collect()
    }

    #[test]
    fn test_impact_index() {
        assert_eq!(impact_index(&with_citations(&[34, 57, 12])), 3);
        assert_eq!(impact_index(&with_citations(&[57, 34, 1])), 2);
        assert_eq!(impact_index(&with_citations(&[10, 8, 5, 4, 3])), 4);
        assert_eq!(impact_index(&with_citations(&[0, 0])), 0);
        assert_eq!(impact_index(&[]), 0);
    }

    #[test]
    fn test_impact_index_is_order_independent() {
        let forward = with_citations(&[1, 2, 3, 4, 5, 6]);
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(impact_index(&forward), 3);
        assert_eq!(impact_index(&backward), 3);
    }

    #[test]
    fn test_weighted_citation_rate_sum() {
        let publications = vec![
            publication(1, Some(2.1)),
            publication(2, None),
            publication(3, Some(0.4)),
        ];
        assert!((weighted_citation_rate_sum(&publications) - 2.5).abs() < 1e-9);
        assert_eq!(weighted_citation_rate_sum(&[]), 0.0);
    }

    #[test]
    fn test_summarize() {
        let publications = vec![publication(34, Some(1.5)), publication(57, None), publication(12, None)];
        let metrics = summarize(&publications);

        assert_eq!(metrics.publication_count, 3);
        assert_eq!(metrics.total_citations, 103);
        assert_eq!(metrics.impact_index, 3);
        assert!((metrics.weighted_citation_rate_sum - 1.5).abs() < 1e-9);
    }
}
