//! Analysis results: citations, short-form suggestions, unsourced claims,
//! and the statistics derived from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::citation::{Citation, CitationStatus};
use super::claim::UnsourcedClaim;

/// Short form the resolver recommends for a citation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortFormType {
    Id,
    Supra,
    ShortCase,
    /// First citation to the authority; use the full form
    None,
}

impl ShortFormType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShortFormType::Id => "id",
            ShortFormType::Supra => "supra",
            ShortFormType::ShortCase => "short_case",
            ShortFormType::None => "none",
        }
    }
}

/// One suggestion per citation, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortFormSuggestion {
    pub citation_id: String,
    pub short_form_type: ShortFormType,
    pub suggested_form: String,
    /// Human-readable rule reference
    pub explanation: String,
    /// Normalized authority key the citation was attributed to
    pub authority: String,
    /// Suggested `[hereinafter ...]` designation on a first citation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hereinafter: Option<String>,
    /// Follows a different authority in the same footnote, so the two can
    /// be joined into one string citation with `;`
    #[serde(default)]
    pub string_cite: bool,
}

/// How the document places its citations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStyle {
    Inline,
    Footnotes,
    LawReview,
}

/// Coarse structure of the analyzed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub has_footnotes: bool,
    pub footnote_count: usize,
    pub citation_style: CitationStyle,
    pub word_count: usize,
}

impl Default for DocumentStructure {
    fn default() -> Self {
        Self {
            has_footnotes: false,
            footnote_count: 0,
            citation_style: CitationStyle::Inline,
            word_count: 0,
        }
    }
}

/// An authority cited more than once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MostCited {
    pub authority: String,
    pub count: usize,
}

/// Summary statistics, always derived from an `AnalysisResult`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total_citations: usize,
    pub complete: usize,
    pub incomplete: usize,
    pub needs_verification: usize,
    pub malformed: usize,
    pub unsourced_claims: usize,
    pub by_type: BTreeMap<String, usize>,
    pub short_form_usage: BTreeMap<String, usize>,
    pub most_cited: Vec<MostCited>,
}

impl AnalysisStats {
    /// Derive statistics from the parts of a result
    pub fn compute(
        citations: &[Citation],
        suggestions: &[ShortFormSuggestion],
        claims: &[UnsourcedClaim],
    ) -> Self {
        let mut stats = Self {
            total_citations: citations.len(),
            unsourced_claims: claims.len(),
            ..Default::default()
        };

        for citation in citations {
            match citation.status {
                CitationStatus::Complete => stats.complete += 1,
                CitationStatus::Incomplete => stats.incomplete += 1,
                CitationStatus::NeedsVerification => stats.needs_verification += 1,
                CitationStatus::Malformed => stats.malformed += 1,
            }
            *stats
                .by_type
                .entry(citation.citation_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        let mut per_authority: BTreeMap<&str, usize> = BTreeMap::new();
        for suggestion in suggestions {
            *stats
                .short_form_usage
                .entry(suggestion.short_form_type.as_str().to_string())
                .or_insert(0) += 1;
            *per_authority.entry(suggestion.authority.as_str()).or_insert(0) += 1;
        }

        let mut most_cited: Vec<MostCited> = per_authority
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(authority, count)| MostCited {
                authority: authority.to_string(),
                count,
            })
            .collect();
        // Stable sort keeps the BTreeMap's key order among equal counts
        most_cited.sort_by(|a, b| b.count.cmp(&a.count));
        most_cited.truncate(5);
        stats.most_cited = most_cited;

        stats
    }
}

/// Everything one analysis pass produces for a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Citations in canonical document order
    pub citations: Vec<Citation>,
    /// One suggestion per citation, same order
    pub short_form_suggestions: Vec<ShortFormSuggestion>,
    pub unsourced_claims: Vec<UnsourcedClaim>,
    pub structure: DocumentStructure,
}

/// Serializable view of a result with its derived statistics
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    #[serde(flatten)]
    pub result: &'a AnalysisResult,
    pub stats: AnalysisStats,
}

impl AnalysisResult {
    pub fn stats(&self) -> AnalysisStats {
        AnalysisStats::compute(
            &self.citations,
            &self.short_form_suggestions,
            &self.unsourced_claims,
        )
    }

    pub fn report(&self) -> AnalysisReport<'_> {
        AnalysisReport {
            result: self,
            stats: self.stats(),
        }
    }

    pub fn citation(&self, id: &str) -> Option<&Citation> {
        self.citations.iter().find(|c| c.id == id)
    }

    pub fn suggestion_for(&self, citation_id: &str) -> Option<&ShortFormSuggestion> {
        self.short_form_suggestions
            .iter()
            .find(|s| s.citation_id == citation_id)
    }
}
