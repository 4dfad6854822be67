//! Unsourced Claim Integration Tests

use bluebook::claims::{ClaimDetector, ClaimSettings};
use bluebook::domain::ClaimType;
use bluebook::Analyzer;

#[test]
fn test_uncited_statistic_is_flagged() {
    let text = "Courts have consistently held that 73% of similar claims fail.";
    let result = Analyzer::new().analyze(text).unwrap();

    assert!(result.citations.is_empty());
    assert_eq!(result.unsourced_claims.len(), 1);

    let claim = &result.unsourced_claims[0];
    assert_eq!(claim.claim_type, ClaimType::Statistical);
    assert!(claim.confidence >= 0.5);
    assert!(!claim.suggested_search_terms.is_empty());
    assert_eq!(claim.text, text);
}

#[test]
fn test_claims_never_overlap_citations() {
    let text = "Brown v. Board, 347 U.S. 483 (1954). Courts have consistently held that 73% of similar claims fail. \
                Historically, the majority of tenants never contested an eviction in court. \
                The Supreme Court held that the statute is unconstitutional. Smith v. Jones, 1 F.3d 1 (1st Cir. 1993).";
    let result = Analyzer::new().analyze(text).unwrap();

    assert_eq!(result.citations.len(), 2);
    assert!(!result.unsourced_claims.is_empty());
    for claim in &result.unsourced_claims {
        assert_eq!(&text[claim.position_start..claim.position_end], claim.text);
        for citation in &result.citations {
            assert!(
                claim.position_end <= citation.position_start
                    || citation.position_end <= claim.position_start,
                "claim {:?} overlaps citation {:?}",
                claim.text,
                citation.raw_text
            );
        }
    }

    // The holding sits right before its citation and counts as supported
    assert!(result
        .unsourced_claims
        .iter()
        .all(|c| !c.text.contains("unconstitutional")));
}

#[test]
fn test_claims_in_document_order() {
    let text = "Historically, the majority of tenants never contested an eviction in court. \
                Courts have consistently held that 73% of similar claims fail.";
    let claims = ClaimDetector::default().detect(text, &[]);
    assert_eq!(claims.len(), 2);
    assert!(claims[0].position_end <= claims[1].position_start);
}

#[test]
fn test_custom_threshold_from_settings() {
    let settings = ClaimSettings {
        threshold: 0.99,
        ..Default::default()
    };
    let analyzer = Analyzer::new().with_claims(settings);
    let result = analyzer
        .analyze("Courts have consistently held that 73% of similar claims fail.")
        .unwrap();
    assert!(result.unsourced_claims.is_empty());
}
