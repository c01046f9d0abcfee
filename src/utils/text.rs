//! Text normalization shared by the resolver and the name matcher.

/// Lowercase `text` and collapse every run of non-alphanumeric characters
/// into a single space, trimming both ends.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}

/// Normalize a DOI for comparison: trimmed and lowercased, `None` if blank
pub fn normalize_doi(doi: &str) -> Option<String> {
    let doi = doi.trim();
    if doi.is_empty() {
        None
    } else {
        Some(doi.to_lowercase())
    }
}

/// Normalize a title for comparison, `None` if nothing alphanumeric remains
pub fn normalize_title(title: &str) -> Option<String> {
    let normalized = normalize_text(title);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Canonical resolver link for a DOI
pub fn doi_url(doi: &str) -> String {
    format!("https://doi.org/{}", doi)
}
