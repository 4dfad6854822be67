//! Citation records and their typed fields.
//!
//! A `Citation` is created by the extractor, filled in by the normalizer,
//! optionally enriched by a lookup, and read-only after that except for
//! whole-record replacement by a user edit.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::extract::spans::compute_citation_id;

/// Kind of authority a citation points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationType {
    Case,
    Statute,
    Regulation,
    LawReview,
    Book,
    Website,
    Other,
}

impl CitationType {
    /// All types in tie-break priority order (most specific first)
    pub const ALL: [CitationType; 7] = [
        CitationType::Case,
        CitationType::Statute,
        CitationType::Regulation,
        CitationType::LawReview,
        CitationType::Book,
        CitationType::Website,
        CitationType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CitationType::Case => "case",
            CitationType::Statute => "statute",
            CitationType::Regulation => "regulation",
            CitationType::LawReview => "law_review",
            CitationType::Book => "book",
            CitationType::Website => "website",
            CitationType::Other => "other",
        }
    }

    /// Overlap tie-break rank; lower wins.
    pub fn priority(&self) -> u8 {
        match self {
            CitationType::Case => 0,
            CitationType::Statute => 1,
            CitationType::Regulation => 2,
            CitationType::LawReview => 3,
            CitationType::Book => 4,
            CitationType::Website => 5,
            CitationType::Other => 6,
        }
    }
}

impl fmt::Display for CitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completeness status of a citation.
///
/// Variants are declared in rank order so `Ord` gives
/// malformed < incomplete < needs_verification < complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStatus {
    Malformed,
    Incomplete,
    NeedsVerification,
    Complete,
}

impl CitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CitationStatus::Malformed => "malformed",
            CitationStatus::Incomplete => "incomplete",
            CitationStatus::NeedsVerification => "needs_verification",
            CitationStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for CitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short form already used by the text of a citation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortFormKind {
    /// `Id.` / `Id. at 5`
    Id,
    /// `Sunstein, supra note 3, at 12`
    Supra,
    /// `Brown, 347 U.S. at 490`
    ShortCase,
}

/// A pinpoint page reference, optionally a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pincite {
    pub start: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
}

impl Pincite {
    pub fn page(start: u32) -> Self {
        Self { start, end: None }
    }

    pub fn range(start: u32, end: u32) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Parse `495`, `495-97`, `495 - 497` or `495–97`.
    ///
    /// Abbreviated range ends borrow their leading digits from the start
    /// page. A range whose end does not exceed its start collapses to the
    /// start page.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let mut parts = cleaned.splitn(2, |c| c == '-' || c == '–' || c == '—');
        let start_str = parts.next()?;
        let start: u32 = start_str.parse().ok()?;

        let end = match parts.next() {
            Some(end_str) if !end_str.is_empty() && end_str.chars().all(|c| c.is_ascii_digit()) => {
                let expanded = if end_str.len() < start_str.len() {
                    format!("{}{}", &start_str[..start_str.len() - end_str.len()], end_str)
                } else {
                    end_str.to_string()
                };
                expanded.parse::<u32>().ok().filter(|e| *e > start)
            }
            _ => None,
        };

        Some(Self { start, end })
    }
}

/// Named field of a citation, used for required-field tables and gap tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Parties,
    Volume,
    Reporter,
    Page,
    Pincite,
    Court,
    Year,
    TitleNumber,
    Code,
    Section,
    Subsection,
    Author,
    Title,
    Journal,
    Publisher,
    Edition,
    Url,
    AccessDate,
    ShortName,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Parties => "parties",
            Field::Volume => "volume",
            Field::Reporter => "reporter",
            Field::Page => "page",
            Field::Pincite => "pincite",
            Field::Court => "court",
            Field::Year => "year",
            Field::TitleNumber => "title_number",
            Field::Code => "code",
            Field::Section => "section",
            Field::Subsection => "subsection",
            Field::Author => "author",
            Field::Title => "title",
            Field::Journal => "journal",
            Field::Publisher => "publisher",
            Field::Edition => "edition",
            Field::Url => "url",
            Field::AccessDate => "access_date",
            Field::ShortName => "short_name",
        }
    }
}

/// Type-specific fields. Every field is optional until resolved; which ones
/// are required depends on the citation type and is decided by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationFields {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parties: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincite: Option<Pincite>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_date: Option<String>,
    /// Name used by a short form in the text (`Brown` in `Brown, 347 U.S. at 490`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    /// Footnote a `supra note N` in the text points back to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_reference: Option<u32>,
    /// Section or paragraph an `Id.` points at (`§ 1715`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    /// Designation the author already gave with `[hereinafter X]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hereinafter: Option<String>,
}

/// `In re Gault`, `Ex parte Milligan` and `ex rel.` captions name the
/// case with a single party.
pub fn is_single_party_caption(name: &str) -> bool {
    let name = name.trim();
    name.starts_with("In re ") || name.starts_with("Ex parte ") || name.contains(" ex rel. ")
}

impl CitationFields {
    /// Whether a field holds a non-blank value
    pub fn has(&self, field: Field) -> bool {
        fn filled(value: &Option<String>) -> bool {
            value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
        }

        match field {
            Field::Parties => {
                let named: Vec<&String> =
                    self.parties.iter().filter(|p| !p.trim().is_empty()).collect();
                named.len() >= 2 || (named.len() == 1 && is_single_party_caption(named[0]))
            }
            Field::Volume => filled(&self.volume),
            Field::Reporter => filled(&self.reporter),
            Field::Page => filled(&self.page),
            Field::Pincite => self.pincite.is_some(),
            Field::Court => filled(&self.court),
            Field::Year => self.year.is_some(),
            Field::TitleNumber => filled(&self.title_number),
            Field::Code => filled(&self.code),
            Field::Section => filled(&self.section),
            Field::Subsection => filled(&self.subsection),
            Field::Author => filled(&self.author),
            Field::Title => filled(&self.title),
            Field::Journal => filled(&self.journal),
            Field::Publisher => filled(&self.publisher),
            Field::Edition => filled(&self.edition),
            Field::Url => filled(&self.url),
            Field::AccessDate => filled(&self.access_date),
            Field::ShortName => filled(&self.short_name),
        }
    }
}

/// Structured record returned by an external legal database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

/// Outcome of one lookup against an external database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub found: bool,
    /// Collaborator name (e.g. "CourtListener")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<LookupRecord>,
    /// Transport or parse failure that was degraded to not-found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LookupResult {
    pub fn found(source: impl Into<String>, data: LookupRecord) -> Self {
        Self {
            found: true,
            source: Some(source.into()),
            data: Some(data),
            error: None,
        }
    }

    pub fn not_found(source: Option<&str>) -> Self {
        Self {
            found: false,
            source: source.map(str::to_string),
            data: None,
            error: None,
        }
    }

    pub fn failed(source: Option<&str>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::not_found(source)
        }
    }
}

/// A citation detected in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Deterministic identifier, unique within a document
    pub id: String,
    #[serde(rename = "type")]
    pub citation_type: CitationType,
    /// Verbatim matched span
    pub raw_text: String,
    /// Byte offset of the span start (inclusive)
    pub position_start: usize,
    /// Byte offset of the span end (exclusive)
    pub position_end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footnote_number: Option<u32>,
    #[serde(flatten)]
    pub fields: CitationFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_form: Option<ShortFormKind>,
    pub status: CitationStatus,
    pub confidence_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_results: Option<LookupResult>,
    /// Name of the grammar that produced this citation
    #[serde(default)]
    pub pattern: String,
    /// Fields the grammar required but the text did not supply
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub structural_gaps: Vec<Field>,
    /// Raw capture groups awaiting normalization
    #[serde(skip)]
    pub raw_fields: BTreeMap<String, String>,
}

impl Citation {
    /// Create a freshly extracted citation. Status and confidence are
    /// provisional until the normalizer runs.
    pub fn new(
        citation_type: CitationType,
        raw_text: impl Into<String>,
        position_start: usize,
        position_end: usize,
        pattern: impl Into<String>,
    ) -> Self {
        let raw_text = raw_text.into();
        let id = compute_citation_id(citation_type, position_start, position_end, &raw_text);

        Self {
            id,
            citation_type,
            raw_text,
            position_start,
            position_end,
            footnote_number: None,
            fields: CitationFields::default(),
            short_form: None,
            status: CitationStatus::Incomplete,
            confidence_score: 0.0,
            lookup_results: None,
            pattern: pattern.into(),
            structural_gaps: Vec::new(),
            raw_fields: BTreeMap::new(),
        }
    }

    /// Record a raw capture group for the normalizer
    pub fn with_raw(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                self.raw_fields.insert(name.to_string(), trimmed.to_string());
            }
        }
        self
    }

    pub fn span(&self) -> (usize, usize) {
        (self.position_start, self.position_end)
    }

    pub fn len(&self) -> usize {
        self.position_end.saturating_sub(self.position_start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.position_start < end && start < self.position_end
    }

    pub fn is_short_form(&self) -> bool {
        self.short_form.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_rank_order() {
        assert!(CitationStatus::Malformed < CitationStatus::Incomplete);
        assert!(CitationStatus::Incomplete < CitationStatus::NeedsVerification);
        assert!(CitationStatus::NeedsVerification < CitationStatus::Complete);
    }

    #[test]
    fn test_pincite_parse() {
        assert_eq!(Pincite::parse("495"), Some(Pincite::page(495)));
        assert_eq!(Pincite::parse("495-97"), Some(Pincite::range(495, 497)));
        assert_eq!(Pincite::parse("495 - 497"), Some(Pincite::range(495, 497)));
        assert_eq!(Pincite::parse("99–101"), Some(Pincite::range(99, 101)));
        assert_eq!(Pincite::parse("12-1"), Some(Pincite::page(12)));
        assert_eq!(Pincite::parse("abc"), None);
    }

    #[test]
    fn test_fields_has_parties_needs_two() {
        let mut fields = CitationFields::default();
        fields.parties = vec!["Brown".to_string()];
        assert!(!fields.has(Field::Parties));
        fields.parties.push("Board".to_string());
        assert!(fields.has(Field::Parties));
    }

    #[test]
    fn test_single_party_caption_counts_as_parties() {
        let mut fields = CitationFields {
            parties: vec!["In re Gault".to_string()],
            ..Default::default()
        };
        assert!(fields.has(Field::Parties));
        fields.parties = vec!["United States ex rel. Smith".to_string()];
        assert!(fields.has(Field::Parties));
        fields.parties = vec!["Gault".to_string()];
        assert!(!fields.has(Field::Parties));
    }

    #[test]
    fn test_blank_values_do_not_count() {
        let fields = CitationFields {
            volume: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(!fields.has(Field::Volume));
    }

    #[test]
    fn test_type_serializes_snake_case() {
        let json = serde_json::to_string(&CitationType::LawReview).unwrap();
        assert_eq!(json, "\"law_review\"");
    }
}
