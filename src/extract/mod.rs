//! Citation extraction
//!
//! Runs every grammar in the pattern library over the full text, settles
//! overlapping candidates with an explicit tie-break, and returns the
//! surviving citations in document order. Fields are left raw for the
//! normalizer.

pub mod patterns;
pub mod spans;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use regex::Captures;
use tracing::debug;

use crate::domain::{Citation, CitationStyle, CitationType, DocumentStructure, Field, ShortFormKind};
use patterns::{
    is_code_abbreviation, party_start, skip_leading_noise, trailing_name_len, CitationPattern,
    HEREINAFTER, PATTERNS,
};
use spans::{find_footnote_markers, footnote_at};

pub use spans::{offset_to_line_col, LineCol};

/// Finds citation spans in document text
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor;

impl Extractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract every recognizable citation, ordered by `position_start`
    pub fn extract(&self, text: &str) -> Vec<Citation> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for pattern in PATTERNS.iter() {
            for caps in pattern.regex.captures_iter(text) {
                if let Some(citation) = build_candidate(pattern, &caps, text) {
                    candidates.push(citation);
                }
            }
        }

        let found = candidates.len();
        let mut citations = resolve_overlaps(candidates);
        debug!(
            candidates = found,
            accepted = citations.len(),
            "Resolved citation candidates"
        );

        let spans: Vec<(usize, usize)> = citations.iter().map(Citation::span).collect();
        let markers = find_footnote_markers(text, &spans);
        for citation in &mut citations {
            citation.footnote_number = footnote_at(&markers, citation.position_start);
        }

        citations
    }

    /// Summarize footnote use and citation placement
    pub fn document_structure(&self, text: &str, citations: &[Citation]) -> DocumentStructure {
        let spans: Vec<(usize, usize)> = citations.iter().map(Citation::span).collect();
        let markers = find_footnote_markers(text, &spans);
        let footnotes: BTreeSet<u32> = markers.iter().map(|m| m.number).collect();

        let in_footnotes = citations
            .iter()
            .filter(|c| c.footnote_number.is_some())
            .count();
        let scholarly = citations.iter().any(|c| {
            matches!(c.citation_type, CitationType::LawReview | CitationType::Book)
                || c.short_form == Some(ShortFormKind::Supra)
        });

        let citation_style = if !citations.is_empty() && in_footnotes * 2 > citations.len() {
            if scholarly {
                CitationStyle::LawReview
            } else {
                CitationStyle::Footnotes
            }
        } else {
            CitationStyle::Inline
        };

        DocumentStructure {
            has_footnotes: !footnotes.is_empty(),
            footnote_count: footnotes.len(),
            citation_style,
            word_count: text.split_whitespace().count(),
        }
    }
}

/// Overlap tie-break: longer span first, then the more specific type,
/// then the earlier start.
pub fn tie_break(a: &Citation, b: &Citation) -> Ordering {
    b.len()
        .cmp(&a.len())
        .then_with(|| a.citation_type.priority().cmp(&b.citation_type.priority()))
        .then_with(|| a.position_start.cmp(&b.position_start))
}

/// Accept candidates in tie-break order, dropping any that overlap an
/// accepted span, then restore document order.
pub fn resolve_overlaps(mut candidates: Vec<Citation>) -> Vec<Citation> {
    candidates.sort_by(tie_break);

    let mut accepted: Vec<Citation> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate.is_empty() {
            continue;
        }
        if accepted
            .iter()
            .any(|a| a.overlaps(candidate.position_start, candidate.position_end))
        {
            continue;
        }
        accepted.push(candidate);
    }

    accepted.sort_by_key(|c| c.position_start);
    accepted
}

/// Turn one regex match into a candidate citation, or reject it
fn build_candidate(pattern: &CitationPattern, caps: &Captures<'_>, text: &str) -> Option<Citation> {
    let whole = caps.get(0)?;
    let mut start = whole.start();
    let mut end = whole.end();

    // The leading name group absorbs signals and earlier words; trim them
    // off the name and the span together.
    let leading = ["p1", "name", "author", "code"]
        .iter()
        .find_map(|g| caps.name(g).filter(|m| m.start() == whole.start()).map(|m| (*g, m)));
    let mut leading_value = None;
    if let Some((group, m)) = leading {
        let skip = if group == "p1" {
            party_start(m.as_str())
        } else {
            skip_leading_noise(m.as_str())
        };
        if skip >= m.as_str().len() {
            return None;
        }
        start = m.start() + skip;
        leading_value = Some((group, &text[start..m.end()]));
    }

    let mut p2 = caps.name("p2").map(|m| m.as_str());
    if pattern.name == "case_name_only" {
        let m = caps.name("p2")?;
        let keep = trailing_name_len(m.as_str());
        end = m.start() + keep;
        p2 = Some(&text[m.start()..end]);
    }

    let group = |name: &str| caps.name(name).map(|m| m.as_str());

    if let Some(reporter) = group("reporter") {
        if is_code_abbreviation(reporter) {
            return None;
        }
    }

    match pattern.name {
        "case_reporter" if group("page").is_none() && group("paren").is_none() => return None,
        "usc" if group("title").is_none() && group("section").is_none() => return None,
        "book" if !looks_like_title(group("title").unwrap_or_default()) => return None,
        _ => {}
    }

    let raw_text = &text[start..end];
    let mut citation = Citation::new(pattern.citation_type, raw_text, start, end, pattern.name);
    citation.short_form = pattern.short_form;

    for name in pattern.regex.capture_names().flatten() {
        let value = match (leading_value, name) {
            (Some((g, v)), n) if g == n => Some(v),
            (_, "p2") => p2,
            _ => group(name),
        };
        citation = citation.with_raw(name, value);
    }

    if matches!(pattern.name, "case_full" | "case_single" | "case_reporter")
        && group("page").is_none()
    {
        citation.structural_gaps.push(Field::Page);
    }

    if pattern.short_form.is_none() {
        let designation = HEREINAFTER
            .captures(&text[end..])
            .and_then(|c| c.name("name"))
            .map(|m| m.as_str());
        citation = citation.with_raw("hereinafter", designation);
    }

    Some(citation)
}

/// Book titles are capitalised words joined by short connectors; prose
/// that happens to precede a parenthetical year is not.
fn looks_like_title(title: &str) -> bool {
    const CONNECTORS: &[&str] = &[
        "a", "an", "and", "at", "by", "for", "from", "in", "of", "on", "or", "the", "to", "with",
    ];

    let words: Vec<&str> = title.split_whitespace().collect();
    !words.is_empty()
        && words.iter().all(|w| {
            let first = w.chars().next().unwrap_or(' ');
            !first.is_lowercase() || CONNECTORS.contains(w)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<Citation> {
        Extractor::new().extract(text)
    }

    #[test]
    fn test_empty_text() {
        assert!(extract("").is_empty());
        assert!(extract("   \n\t").is_empty());
    }

    #[test]
    fn test_signal_trimmed_from_span() {
        let text = "See Brown v. Board, 347 U.S. 483 (1954).";
        let citations = extract(text);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].raw_text, "Brown v. Board, 347 U.S. 483 (1954)");
        assert_eq!(citations[0].position_start, 4);
        assert_eq!(citations[0].raw_fields.get("p1").map(String::as_str), Some("Brown"));
    }

    #[test]
    fn test_longest_candidate_wins() {
        let text = "Brown v. Board, 347 U.S. 483, 495 (1954).";
        let citations = extract(text);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].pattern, "case_full");
    }

    #[test]
    fn test_name_only_case_trims_narrative() {
        let text = "The reasoning in Smith v. Jones was later rejected.";
        let citations = extract(text);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].raw_text, "Smith v. Jones");
        assert_eq!(citations[0].pattern, "case_name_only");
    }

    #[test]
    fn test_party_after_narrative_preposition() {
        let citations = extract("The Court in Roe v. Wade, 410 U.S. 113 (1973), held otherwise.");
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].raw_text, "Roe v. Wade, 410 U.S. 113 (1973)");
        assert_eq!(citations[0].raw_fields.get("p1").map(String::as_str), Some("Roe"));

        let citations = extract("Under the holding in Miranda v. Arizona, 384 U.S. 436 (1966).");
        assert_eq!(citations[0].raw_fields.get("p1").map(String::as_str), Some("Miranda"));
    }

    #[test]
    fn test_single_party_caption_extracted() {
        let citations = extract("See In re Gault, 387 U.S. 1 (1967).");
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].raw_text, "In re Gault, 387 U.S. 1 (1967)");
        assert_eq!(citations[0].pattern, "case_single");
        assert_eq!(
            citations[0].raw_fields.get("single").map(String::as_str),
            Some("In re Gault")
        );
    }

    #[test]
    fn test_hereinafter_attached_to_preceding_citation() {
        let text = "Jane Roe, The Law of Everything 12 (2d ed. 2001) [hereinafter Everything].";
        let citations = extract(text);
        assert_eq!(citations.len(), 1);
        assert_eq!(
            citations[0].raw_fields.get("hereinafter").map(String::as_str),
            Some("Everything")
        );
        assert!(!citations[0].raw_text.contains("hereinafter"));
    }

    #[test]
    fn test_missing_page_is_structural_gap() {
        let citations = extract("The cite 347 U.S. (1954) is broken.");
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].structural_gaps, vec![Field::Page]);
    }

    #[test]
    fn test_statute_not_read_as_reporter() {
        let citations = extract("Claims arise under 42 U.S.C. § 1983 (2018).");
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].citation_type, CitationType::Statute);
    }

    #[test]
    fn test_prose_before_year_is_not_a_book() {
        assert!(extract("Moreover, Congress amended the statute (1990).").is_empty());
    }

    #[test]
    fn test_tie_break_prefers_case_on_equal_span() {
        let a = Citation::new(CitationType::Book, "x", 0, 10, "book");
        let b = Citation::new(CitationType::Case, "y", 0, 10, "case_full");
        let resolved = resolve_overlaps(vec![a, b]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].citation_type, CitationType::Case);
    }

    #[test]
    fn test_footnote_numbers_assigned() {
        let text = "Body.[1]\n1. See Brown v. Board, 347 U.S. 483 (1954).\n2. Id. at 495.";
        let citations = extract(text);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].footnote_number, Some(1));
        assert_eq!(citations[1].footnote_number, Some(2));

        let structure = Extractor::new().document_structure(text, &citations);
        assert!(structure.has_footnotes);
        assert_eq!(structure.footnote_count, 2);
        assert_eq!(structure.citation_style, CitationStyle::Footnotes);
    }
}
