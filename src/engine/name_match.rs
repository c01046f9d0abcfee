//! Author-identity heuristics for providers whose author search is imprecise.

use crate::utils::normalize_text;

/// A person name split into the parts the matcher compares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts {
    pub last: String,
    pub first: Option<String>,
    pub initial: Option<char>,
}

impl NameParts {
    /// Parse a target full name written "First [Middle] Last"
    pub fn from_full_name(name: &str) -> Option<Self> {
        let normalized = normalize_text(name);
        let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
        let last = tokens.last()?.to_string();
        let first = (tokens.len() >= 2).then(|| tokens[0].to_string());
        let initial = first.as_ref().and_then(|f| f.chars().next());

        Some(Self {
            last,
            first,
            initial,
        })
    }

    /// Parse a candidate author string in whatever format a provider used
    ///
    /// "Last, First ..." takes the text before the comma as the surname.
    /// Otherwise the last token is the surname and the first token the given
    /// name, except "Last X" (two tokens, one-letter second) which is read as
    /// surname plus initial.
    pub fn from_candidate(candidate: &str) -> Option<Self> {
        if let Some((before, after)) = candidate.split_once(',') {
            let last = normalize_text(before);
            if last.is_empty() {
                return None;
            }
            let first = normalize_text(after)
                .split(' ')
                .find(|t| !t.is_empty())
                .map(str::to_string);
            let initial = first.as_ref().and_then(|f| f.chars().next());
            return Some(Self {
                last,
                first,
                initial,
            });
        }

        let normalized = normalize_text(candidate);
        let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();

        if tokens.len() == 2 && tokens[1].chars().count() == 1 {
            return Some(Self {
                last: tokens[0].to_string(),
                first: None,
                initial: tokens[1].chars().next(),
            });
        }

        let last = tokens.last()?.to_string();
        let first = (tokens.len() >= 2).then(|| tokens[0].to_string());
        let initial = first.as_ref().and_then(|f| f.chars().next());

        Some(Self {
            last,
            first,
            initial,
        })
    }
}

/// Whether `candidate` plausibly denotes the person named `target`
///
/// First tries containment of every target token in the candidate, then falls
/// back to comparing surname plus given name or initial.
pub fn name_matches(candidate: &str, target: &str) -> bool {
    let normalized_target = normalize_text(target);
    let target_tokens: Vec<&str> = normalized_target
        .split(' ')
        .filter(|t| !t.is_empty())
        .collect();
    if target_tokens.is_empty() {
        return false;
    }

    let normalized_candidate = normalize_text(candidate);
    if target_tokens
        .iter()
        .all(|token| normalized_candidate.contains(token))
    {
        return true;
    }

    let (Some(target), Some(parsed)) = (
        NameParts::from_full_name(target),
        NameParts::from_candidate(candidate),
    ) else {
        return false;
    };

    if parsed.last != target.last {
        return false;
    }

    let first_matches = target.first.is_some() && target.first == parsed.first;
    let initial_matches = target.initial.is_some() && target.initial == parsed.initial;
    first_matches || initial_matches
}

/// Whether any of `authors` matches any of `targets`
pub fn any_author_matches<A, T>(authors: &[A], targets: &[T]) -> bool
where
    A: AsRef<str>,
    T: AsRef<str>,
{
    authors.iter().any(|author| {
        targets
            .iter()
            .any(|target| name_matches(author.as_ref(), target.as_ref()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_match_with_comma_format() {
        assert!(name_matches("Lee, J.", "Jordan Lee"));
        assert!(name_matches("LEE, JORDAN", "Jordan Lee"));
    }

    #[test]
    fn test_containment_fast_path() {
        assert!(name_matches("Jordan A. Lee", "Jordan Lee"));
        assert!(name_matches("Lee Jordan", "Jordan Lee"));
    }

    #[test]
    fn test_different_surname_rejected() {
        assert!(!name_matches("Jordan Smith", "Jordan Lee"));
        assert!(!name_matches("Smith, J.", "Jordan Lee"));
    }

    #[test]
    fn test_surname_initial_format() {
        assert!(name_matches("Lee J", "Jordan Lee"));
        assert!(!name_matches("Lee K", "Jordan Lee"));
    }

    #[test]
    fn test_first_name_and_initial_mismatch() {
        assert!(!name_matches("Kim Lee", "Jordan Lee"));
        assert!(!name_matches("Lee, Kim", "Jordan Lee"));
    }

    #[test]
    fn test_empty_target_never_matches() {
        assert!(!name_matches("Jordan Lee", ""));
        assert!(!name_matches("Jordan Lee", " .,- "));
    }

    #[test]
    fn test_parse_candidate_formats() {
        assert_eq!(
            NameParts::from_candidate("Lee, Jordan A."),
            Some(NameParts {
                last: "lee".to_string(),
                first: Some("jordan".to_string()),
                initial: Some('j'),
            })
        );
        assert_eq!(
            NameParts::from_candidate("Lee J"),
            Some(NameParts {
                last: "lee".to_string(),
                first: None,
                initial: Some('j'),
            })
        );
        assert_eq!(
            NameParts::from_candidate("Jordan Alex Lee"),
            Some(NameParts {
                last: "lee".to_string(),
                first: Some("jordan".to_string()),
                initial: Some('j'),
            })
        );
        assert_eq!(NameParts::from_candidate(""), None);
    }

    #[test]
    fn test_any_author_matches() {
        let authors = ["Smith, A.", "Lee, J."];
        assert!(any_author_matches(&authors, &["Jordan Lee"]));
        assert!(!any_author_matches(&authors, &["Ada Park"]));
        assert!(!any_author_matches::<&str, &str>(&[], &["Jordan Lee"]));
    }
}
