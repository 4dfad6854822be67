//! Document analysis pipeline.
//!
//! extract → normalize → (lookups) → resolve short forms, with claim
//! detection running off the accepted citation spans. Each call works on
//! its own text and returns its own result; the analyzer holds no state
//! between documents.

use anyhow::Result;
use tracing::{debug, info, warn};

use super::error::AnalysisError;
use super::limits::InputLimits;
use super::lookup::LookupCoordinator;
use crate::claims::{ClaimDetector, ClaimSettings};
use crate::config::Config;
use crate::domain::{AnalysisResult, Citation, UnsourcedClaim};
use crate::extract::Extractor;
use crate::format::rules::FormatRules;
use crate::format::Formatter;
use crate::normalize::Normalizer;
use crate::resolver::ShortFormResolver;

/// Runs the full pipeline over one document at a time
#[derive(Clone, Default)]
pub struct Analyzer {
    limits: InputLimits,
    extractor: Extractor,
    normalizer: Normalizer,
    resolver: ShortFormResolver,
    detector: ClaimDetector,
    lookups: Option<LookupCoordinator>,
}

impl Analyzer {
    /// Offline analyzer with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer configured from a loaded config; lookups are wired only
    /// when enabled
    pub fn from_config(config: &Config) -> Result<Self> {
        let formatter = Formatter::new(FormatRules::with_overrides(&config.rules));
        let mut analyzer = Self::new()
            .with_limits(config.limits.clone())
            .with_claims(config.claims.clone())
            .with_resolver(
                ShortFormResolver::new(formatter)
                    .with_case_short_form(config.resolver.case_short_form),
            );

        if config.lookup.enabled {
            let coordinator = LookupCoordinator::from_settings(&config.lookup)?
                .with_max_concurrent(config.limits.max_concurrent_lookups);
            analyzer = analyzer.with_lookups(coordinator);
        }
        Ok(analyzer)
    }

    pub fn with_limits(mut self, limits: InputLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_claims(mut self, settings: ClaimSettings) -> Self {
        self.detector = ClaimDetector::new(settings);
        self
    }

    pub fn with_resolver(mut self, resolver: ShortFormResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_lookups(mut self, coordinator: LookupCoordinator) -> Self {
        self.lookups = Some(coordinator);
        self
    }

    pub fn formatter(&self) -> &Formatter {
        self.resolver.formatter()
    }

    pub fn has_lookups(&self) -> bool {
        self.lookups.is_some()
    }

    /// Analyze without touching the network
    pub fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        self.limits.validate_input(text)?;
        if text.trim().is_empty() {
            return Ok(self.empty_result(text));
        }

        let citations = self.extract_and_normalize(text);
        let claims = self.detect_claims(text, &citations);
        self.finish(text, citations, claims)
    }

    /// Analyze and complete citations from the configured databases. Claim
    /// detection runs alongside the lookups.
    pub async fn analyze_with_lookup(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        let Some(lookups) = &self.lookups else {
            return self.analyze(text);
        };

        self.limits.validate_input(text)?;
        if text.trim().is_empty() {
            return Ok(self.empty_result(text));
        }

        let citations = self.extract_and_normalize(text);
        let spans: Vec<(usize, usize)> = citations.iter().map(Citation::span).collect();

        let detector = self.detector.clone();
        let owned_text = text.to_string();
        let claims_task =
            tokio::task::spawn_blocking(move || detector.detect(&owned_text, &spans));

        let citations = lookups
            .complete_all(citations, self.limits.max_lookups)
            .await;

        let claims = match claims_task.await {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "Claim detection task failed");
                Vec::new()
            }
        };

        self.finish(text, citations, claims)
    }

    /// Replace one citation with a caller-edited copy and recompute the
    /// short-form suggestions. The result is untouched on error.
    pub fn apply_edit(&self, result: &mut AnalysisResult, edited: Citation) -> Result<(), AnalysisError> {
        let index = result
            .citations
            .iter()
            .position(|c| c.id == edited.id)
            .ok_or_else(|| AnalysisError::UnknownCitation(edited.id.clone()))?;

        let mut citations = result.citations.clone();
        let mut edited = edited;
        self.normalizer.grade(&mut edited);
        citations[index] = edited;

        let suggestions = self.resolver.resolve(&citations)?;
        result.citations = citations;
        result.short_form_suggestions = suggestions;
        debug!(index, "Applied citation edit");
        Ok(())
    }

    fn extract_and_normalize(&self, text: &str) -> Vec<Citation> {
        self.extractor
            .extract(text)
            .into_iter()
            .map(|c| self.normalizer.normalize(c))
            .collect()
    }

    fn detect_claims(&self, text: &str, citations: &[Citation]) -> Vec<UnsourcedClaim> {
        let spans: Vec<(usize, usize)> = citations.iter().map(Citation::span).collect();
        self.detector.detect(text, &spans)
    }

    fn finish(
        &self,
        text: &str,
        citations: Vec<Citation>,
        unsourced_claims: Vec<UnsourcedClaim>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let short_form_suggestions = self.resolver.resolve(&citations)?;
        let structure = self.extractor.document_structure(text, &citations);

        info!(
            citations = citations.len(),
            claims = unsourced_claims.len(),
            words = structure.word_count,
            "Analysis complete"
        );

        Ok(AnalysisResult {
            citations,
            short_form_suggestions,
            unsourced_claims,
            structure,
        })
    }

    fn empty_result(&self, text: &str) -> AnalysisResult {
        AnalysisResult {
            structure: self.extractor.document_structure(text, &[]),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CitationStatus, CitationType, ShortFormType};

    #[test]
    fn test_empty_text_is_empty_result() {
        let result = Analyzer::new().analyze("  \n ").unwrap();
        assert!(result.citations.is_empty());
        assert!(result.unsourced_claims.is_empty());
        assert!(result.short_form_suggestions.is_empty());
    }

    #[test]
    fn test_input_limit_enforced() {
        let analyzer = Analyzer::new().with_limits(InputLimits {
            max_input_bytes: 10,
            ..Default::default()
        });
        let err = analyzer.analyze("this text is longer than ten bytes").unwrap_err();
        assert!(matches!(err, AnalysisError::InputTooLarge { limit: 10, .. }));
    }

    #[test]
    fn test_id_after_repeat_case() {
        let text = "Brown v. Board, 347 U.S. 483 (1954). Later, Brown v. Board, 347 U.S. 483, 495 (1954).";
        let result = Analyzer::new().analyze(text).unwrap();
        assert_eq!(result.citations.len(), 2);
        assert_eq!(result.short_form_suggestions[1].short_form_type, ShortFormType::Id);
        assert_eq!(result.short_form_suggestions[1].suggested_form, "Id. at 495.");
    }

    #[test]
    fn test_edit_replaces_and_reresolves() {
        let text = "Brown v. Board, 347 U.S. 483 (1954). Later, Brown v. Board, 347 U.S. 483, 495 (1954).";
        let analyzer = Analyzer::new();
        let mut result = analyzer.analyze(text).unwrap();

        let mut edited = result.citations[1].clone();
        edited.fields.parties = vec!["Smith".into(), "Jones".into()];
        edited.fields.page = Some("1".into());
        analyzer.apply_edit(&mut result, edited).unwrap();

        assert_eq!(result.citations[1].fields.parties, vec!["Smith", "Jones"]);
        assert_eq!(result.short_form_suggestions[1].short_form_type, ShortFormType::None);
    }

    #[test]
    fn test_edit_of_unknown_citation() {
        let analyzer = Analyzer::new();
        let mut result = analyzer
            .analyze("Brown v. Board, 347 U.S. 483 (1954).")
            .unwrap();
        let stray = Citation::new(CitationType::Case, "x", 0, 1, "case_full");
        let err = analyzer.apply_edit(&mut result, stray).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownCitation(_)));
    }

    #[test]
    fn test_edit_breaking_order_leaves_result_untouched() {
        let text = "Brown v. Board, 347 U.S. 483 (1954). See Smith v. Jones, 1 F.3d 1 (1st Cir. 1993).";
        let analyzer = Analyzer::new();
        let mut result = analyzer.analyze(text).unwrap();
        let before = result.clone();

        let mut edited = result.citations[1].clone();
        edited.position_start = 0;
        let err = analyzer.apply_edit(&mut result, edited).unwrap_err();
        assert!(matches!(err, AnalysisError::Ordering { .. }));
        assert_eq!(result, before);
    }

    #[tokio::test]
    async fn test_offline_lookup_path_matches_analyze() {
        let text = "Courts have consistently held that 73% of similar claims fail.";
        let analyzer = Analyzer::new();
        let offline = analyzer.analyze(text).unwrap();
        let online = analyzer.analyze_with_lookup(text).await.unwrap();
        assert_eq!(offline, online);
        assert_eq!(online.unsourced_claims.len(), 1);
    }

    #[test]
    fn test_malformed_citation_surfaced() {
        let result = Analyzer::new().analyze("The cite 347 U.S. (1954) is broken.").unwrap();
        assert_eq!(result.citations.len(), 1);
        assert_eq!(result.citations[0].status, CitationStatus::Malformed);
        assert!(result.citations[0].confidence_score < 0.5);
    }
}
