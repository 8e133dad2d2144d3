//! Document-link extraction from the free-text "Study Documents" cell.
//!
//! The cell is messy: entries are pipe-separated, each entry is usually
//! `label, url`, but labels contain commas ("Consent Form, Version 2"),
//! some entries carry two links back to back, and some carry no label.
//!
//! Each pipe-separated segment is run through an ordered list of rules; the
//! first rule that returns [`SegmentMatch::Matched`] wins:
//!
//! 1. [`pdf_url_rule`]: find every `http(s)://…\.pdf` URL that ends at a token
//!    boundary; the label is the text in front of the URL's first occurrence.
//! 2. [`label_comma_url_rule`]: `label, http…` split on the first comma.
//!
//! Because the URL search runs before any comma split, commas inside a label
//! never truncate it. Segments no rule recognises are dropped silently.

use regex::Regex;
use trialdocs_common::DocumentReference;

const PDF_SUFFIX: &str = ".pdf";

/// Outcome of applying one rule to one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentMatch {
    Matched(Vec<DocumentReference>),
    NoMatch,
}

/// A single extraction rule over one trimmed, non-empty segment.
pub type SegmentRule = fn(&str) -> SegmentMatch;

/// Rules in the order they are tried.
pub const SEGMENT_RULES: &[SegmentRule] = &[pdf_url_rule, label_comma_url_rule];

/// Extract `(label, url)` references from a documents cell, in source order.
///
/// Empty, `nan` and `none` cells (any case, surrounding whitespace ignored)
/// yield no references. Duplicates are kept.
pub fn extract_references(cell: &str) -> Vec<DocumentReference> {
    if is_null_cell(cell) {
        return Vec::new();
    }

    cell.split('|')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .flat_map(classify_segment)
        .collect()
}

/// Apply [`SEGMENT_RULES`] to a segment, returning the first match (or nothing).
pub fn classify_segment(segment: &str) -> Vec<DocumentReference> {
    for rule in SEGMENT_RULES {
        if let SegmentMatch::Matched(refs) = rule(segment) {
            return refs;
        }
    }
    Vec::new()
}

/// Rule 1: every `.pdf` URL in the segment, labelled by the text before it.
pub fn pdf_url_rule(segment: &str) -> SegmentMatch {
    let urls = find_pdf_urls(segment);
    if urls.is_empty() {
        return SegmentMatch::NoMatch;
    }

    let refs = urls
        .into_iter()
        .map(|url| {
            // Prefix before the first occurrence, which for a repeated URL is the earliest one.
            let prefix = segment.split_once(url).map(|(before, _)| before).unwrap_or("");
            let label = prefix.trim().trim_matches(',').trim();
            DocumentReference::new(label, url)
        })
        .collect();

    SegmentMatch::Matched(refs)
}

/// Rule 2: `label, url` where the text after the first comma looks like a URL.
pub fn label_comma_url_rule(segment: &str) -> SegmentMatch {
    let Some((label, rest)) = segment.split_once(',') else {
        return SegmentMatch::NoMatch;
    };
    let url = rest.trim();
    if !starts_with_ignore_case(url, "http") {
        return SegmentMatch::NoMatch;
    }
    SegmentMatch::Matched(vec![DocumentReference::new(label.trim(), url)])
}

/// URLs ending in `.pdf` that are followed by whitespace or the end of the segment.
///
/// Equivalent to the pattern `https?://[^\s,|]+?\.pdf(?!\S)`: a candidate run
/// only matches when the whole run ends in `.pdf` and nothing but whitespace
/// follows it. Query strings and fragments after `.pdf` therefore disqualify
/// the link.
pub fn find_pdf_urls(segment: &str) -> Vec<&str> {
    url_run_regex()
        .find_iter(segment)
        .filter(|m| {
            let run = m.as_str();
            let scheme_len = run.find("://").map(|i| i + 3).unwrap_or(0);
            let boundary_ok = segment[m.end()..]
                .chars()
                .next()
                .map_or(true, char::is_whitespace);
            boundary_ok
                && run.len() > scheme_len + PDF_SUFFIX.len()
                && ends_with_ignore_case(run, PDF_SUFFIX)
        })
        .map(|m| m.as_str())
        .collect()
}

/// Candidate URL runs: scheme followed by characters that are not whitespace, comma or pipe.
fn url_run_regex() -> &'static Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)https?://[^\s,|]+").unwrap())
}

fn is_null_cell(cell: &str) -> bool {
    let v = cell.trim().to_lowercase();
    v.is_empty() || v == "nan" || v == "none"
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn ends_with_ignore_case(s: &str, suffix: &str) -> bool {
    s.len() >= suffix.len()
        && s.get(s.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(cell: &str) -> Vec<(String, String)> {
        extract_references(cell)
            .into_iter()
            .map(|r| (r.label, r.url))
            .collect()
    }

    fn p(label: &str, url: &str) -> (String, String) {
        (label.to_string(), url.to_string())
    }

    #[test]
    fn test_pipe_separated_label_url_pairs() {
        assert_eq!(
            pairs("Protocol, https://x.org/a.pdf | SAP, https://x.org/b.pdf"),
            vec![p("Protocol", "https://x.org/a.pdf"), p("SAP", "https://x.org/b.pdf")]
        );
    }

    #[test]
    fn test_bare_url_gets_default_label() {
        assert_eq!(pairs("https://x.org/a.pdf"), vec![p("Document", "https://x.org/a.pdf")]);
    }

    #[test]
    fn test_null_like_cells_are_empty() {
        assert!(pairs("").is_empty());
        assert!(pairs("NaN").is_empty());
        assert!(pairs("  none ").is_empty());
        assert!(pairs("   ").is_empty());
    }

    #[test]
    fn test_comma_in_label_is_preserved() {
        assert_eq!(
            pairs("Consent Form, Version 2, https://x.org/c.pdf"),
            vec![p("Consent Form, Version 2", "https://x.org/c.pdf")]
        );
        assert_eq!(
            pairs("Protocol, Rev 2, https://x/y.pdf"),
            vec![p("Protocol, Rev 2", "https://x/y.pdf")]
        );
    }

    #[test]
    fn test_two_urls_in_one_segment() {
        let got = pairs("Study Protocol and SAP https://x.org/a.pdf https://x.org/b.pdf");
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], p("Study Protocol and SAP", "https://x.org/a.pdf"));
        assert_eq!(got[1].1, "https://x.org/b.pdf");
        assert!(got[1].0.starts_with("Study Protocol and SAP"));
    }

    #[test]
    fn test_comma_fallback_for_non_pdf_links() {
        assert_eq!(
            pairs("Informed Consent Form, https://cdn.example.org/ICF_000.PDF?download=1"),
            vec![p("Informed Consent Form", "https://cdn.example.org/ICF_000.PDF?download=1")]
        );
        assert_eq!(
            pairs("Redirect,  HTTP://example.org/doc/42"),
            vec![p("Redirect", "HTTP://example.org/doc/42")]
        );
    }

    #[test]
    fn test_unrecognised_segments_are_dropped() {
        assert!(pairs("Protocol, see registry").is_empty());
        assert!(pairs("just some text").is_empty());
        assert_eq!(
            pairs("garbage | Protocol, https://x.org/a.pdf | other, text"),
            vec![p("Protocol", "https://x.org/a.pdf")]
        );
    }

    #[test]
    fn test_url_must_end_at_token_boundary() {
        // Followed by a comma: not a boundary, so the comma rule cannot apply either
        // (nothing after the first comma starts with http).
        assert!(find_pdf_urls("https://x.org/a.pdf,").is_empty());
        assert_eq!(find_pdf_urls("https://x.org/a.pdf trailing"), vec!["https://x.org/a.pdf"]);
        assert_eq!(find_pdf_urls("see https://x.org/a.pdf.pdf"), vec!["https://x.org/a.pdf.pdf"]);
        assert!(find_pdf_urls("https://x.org/a.pdf#page=2").is_empty());
        assert!(find_pdf_urls("https://.pdf").is_empty());
    }

    #[test]
    fn test_pdf_suffix_is_case_insensitive() {
        assert_eq!(pairs("ICF, HTTPS://X.ORG/ICF.PDF"), vec![p("ICF", "HTTPS://X.ORG/ICF.PDF")]);
    }

    #[test]
    fn test_duplicates_are_kept_in_order() {
        let got = pairs("A, https://x.org/a.pdf | A, https://x.org/a.pdf");
        assert_eq!(got, vec![p("A", "https://x.org/a.pdf"), p("A", "https://x.org/a.pdf")]);
    }

    #[test]
    fn test_rule_order_is_url_first() {
        let seg = "Protocol, Rev 2, https://x/y.pdf";
        assert!(matches!(pdf_url_rule(seg), SegmentMatch::Matched(_)));
        // The comma rule alone would reject this segment.
        assert_eq!(label_comma_url_rule(seg), SegmentMatch::NoMatch);
        assert_eq!(SEGMENT_RULES.len(), 2);
    }
}
