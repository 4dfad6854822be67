//! Extraction Integration Tests
//!
//! Span bounds, non-overlap and idempotence over mixed documents.

use bluebook::domain::{CitationStatus, CitationType};
use bluebook::extract::Extractor;
use bluebook::Analyzer;

const DOCUMENTS: &[&str] = &[
    "See Brown v. Board, 347 U.S. 483 (1954). See also Smith v. Jones, 1 F.3d 1 (1st Cir. 1993). Brown, 347 U.S. at 490.",
    "Claims arise under 42 U.S.C. § 1983 (2018) and 29 C.F.R. § 1630.2 (2020). Id. at 4.",
    "Cass R. Sunstein, On the Expressive Function of Law, 144 U. Pa. L. Rev. 2021 (1996). Sunstein, supra, at 2024.",
    "The agency posted guidance at https://www.example.gov/guidance.html (last visited Jan. 5, 2024).",
    "Plain narrative with no authority at all, written for the test.",
    "Ünïcode prose — “quoted” — then Marbury v. Madison, 5 U.S. 137 (1803).",
];

#[test]
fn test_spans_in_bounds_and_match_raw_text() {
    let extractor = Extractor::new();
    for text in DOCUMENTS {
        for citation in extractor.extract(text) {
            assert!(citation.position_start < citation.position_end, "{text}");
            assert!(citation.position_end <= text.len(), "{text}");
            assert_eq!(
                &text[citation.position_start..citation.position_end],
                citation.raw_text
            );
        }
    }
}

#[test]
fn test_spans_ordered_and_disjoint() {
    let extractor = Extractor::new();
    for text in DOCUMENTS {
        let citations = extractor.extract(text);
        for pair in citations.windows(2) {
            assert!(
                pair[0].position_end <= pair[1].position_start,
                "overlap in {text}: {:?} / {:?}",
                pair[0].raw_text,
                pair[1].raw_text
            );
        }
    }
}

#[test]
fn test_analysis_is_idempotent() {
    let analyzer = Analyzer::new();
    for text in DOCUMENTS {
        let first = analyzer.analyze(text).unwrap();
        let second = analyzer.analyze(text).unwrap();
        assert_eq!(first, second, "{text}");
    }
}

#[test]
fn test_citation_ids_are_deterministic() {
    let text = DOCUMENTS[0];
    let a: Vec<String> = Extractor::new().extract(text).into_iter().map(|c| c.id).collect();
    let b: Vec<String> = Extractor::new().extract(text).into_iter().map(|c| c.id).collect();
    assert_eq!(a, b);
    assert_eq!(a.len(), 3);
}

#[test]
fn test_mixed_document_types() {
    let result = Analyzer::new().analyze(DOCUMENTS[1]).unwrap();
    let types: Vec<CitationType> = result.citations.iter().map(|c| c.citation_type).collect();
    assert_eq!(
        types,
        vec![
            CitationType::Statute,
            CitationType::Regulation,
            CitationType::Other
        ]
    );
}

#[test]
fn test_malformed_reporter_citation() {
    let result = Analyzer::new()
        .analyze("The cite 347 U.S. (1954) is broken.")
        .unwrap();

    assert_eq!(result.citations.len(), 1);
    let citation = &result.citations[0];
    assert_eq!(citation.citation_type, CitationType::Case);
    assert_eq!(citation.status, CitationStatus::Malformed);
    assert!(citation.confidence_score < 0.5);
}

#[test]
fn test_stats_agree_with_citations() {
    let result = Analyzer::new().analyze(DOCUMENTS[0]).unwrap();
    let stats = result.stats();
    assert_eq!(stats.total_citations, result.citations.len());
    assert_eq!(
        stats.complete + stats.incomplete + stats.needs_verification + stats.malformed,
        stats.total_citations
    );
    assert_eq!(stats.unsourced_claims, result.unsourced_claims.len());
}

#[test]
fn test_single_party_caption_is_complete() {
    let result = Analyzer::new().analyze("See In re Gault, 387 U.S. 1 (1967).").unwrap();

    assert_eq!(result.citations.len(), 1);
    let citation = &result.citations[0];
    assert_eq!(citation.raw_text, "In re Gault, 387 U.S. 1 (1967)");
    assert_eq!(citation.fields.parties, vec!["In re Gault"]);
    assert_eq!(citation.status, CitationStatus::Complete);
    assert_eq!(
        result.short_form_suggestions[0].suggested_form,
        "*In re Gault*, 387 U.S. 1 (1967)."
    );
}

#[test]
fn test_non_ascii_party_names_kept() {
    let result = Analyzer::new()
        .analyze("Ünïcode v. Tëst, 5 F.3d 9 (1st Cir. 1995).")
        .unwrap();

    assert_eq!(result.citations.len(), 1);
    let citation = &result.citations[0];
    assert_eq!(citation.citation_type, CitationType::Case);
    assert_eq!(citation.fields.parties, vec!["Ünïcode", "Tëst"]);
    assert_eq!(citation.status, CitationStatus::Complete);
}
