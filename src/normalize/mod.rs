//! Field normalization, completeness status and confidence scoring
//!
//! The normalizer turns the extractor's raw capture groups into typed
//! fields, then grades the citation. Grading is a pure function of the
//! fields, so it is re-run after a lookup fills gaps or a user edit
//! replaces a record.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::domain::{Citation, CitationStatus, CitationType, Field, Pincite, ShortFormKind};
use crate::extract::patterns::specificity;
use crate::format::rules::bluebook_date;

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(1[6-9]\d{2}|20\d{2})\b").unwrap());

static VERSUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+vs?\.\s+").unwrap());

/// Reporters of the Supreme Court; their citations omit the court
pub const SUPREME_COURT_REPORTERS: &[&str] = &["U.S.", "S. Ct.", "L. Ed.", "L. Ed. 2d"];

const SPECIFICITY_WEIGHT: f64 = 0.35;
const COMPLETENESS_WEIGHT: f64 = 0.45;
const CLEAN_WEIGHT: f64 = 0.20;
const MALFORMED_PENALTY: f64 = 0.6;
/// Added once a lookup has confirmed the citation
pub const LOOKUP_BONUS: f64 = 0.1;

const MIN_YEAR: i32 = 1600;
const MAX_YEAR: i32 = 2100;

/// Parses raw fields and grades citations
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw capture groups into typed fields, then grade
    pub fn normalize(&self, mut citation: Citation) -> Citation {
        let raw = std::mem::take(&mut citation.raw_fields);
        let fields = &mut citation.fields;

        for (name, value) in &raw {
            match name.as_str() {
                "p1" | "p2" => {
                    let party = clean_text(value);
                    if !party.is_empty() {
                        fields.parties.push(party);
                    }
                }
                "single" => fields.parties = vec![clean_text(value)],
                "name" => fields.short_name = Some(clean_text(value)),
                "volume" => fields.volume = Some(collapse_whitespace(value)),
                "reporter" => fields.reporter = Some(collapse_whitespace(value)),
                "page" => fields.page = Some(value.replace(',', "")),
                "pin" => fields.pincite = Pincite::parse(value),
                "paren" => {
                    let (court, year) = split_court_year(value);
                    fields.court = court;
                    fields.year = fields.year.or(year);
                }
                "title" if matches!(citation.pattern.as_str(), "usc" | "cfr") => {
                    fields.title_number = Some(value.clone())
                }
                "title" => fields.title = Some(clean_text(value)),
                "section" => fields.section = Some(value.clone()),
                "subsection" => fields.subsection = Some(value.clone()),
                "code" => fields.code = Some(collapse_whitespace(value)),
                "year" if citation.citation_type == CitationType::Statute => {
                    fields.year = fields.year.or(parse_year(value));
                    fields.publisher = statute_publisher(value);
                }
                "year" | "date" => fields.year = fields.year.or(parse_year(value)),
                "author" => fields.author = Some(clean_text(value)),
                "journal" => fields.journal = Some(collapse_whitespace(value)),
                "edition" => fields.edition = Some(value.clone()),
                "publisher" => fields.publisher = Some(clean_text(value)),
                "url" => fields.url = Some(value.clone()),
                "access" => fields.access_date = Some(normalize_access_date(value)),
                "note" => fields.note_reference = value.parse().ok(),
                "locator" => fields.locator = Some(normalize_locator(value)),
                "hereinafter" => fields.hereinafter = Some(clean_text(value)),
                _ => {}
            }
        }

        match citation.pattern.as_str() {
            "usc" => fields.code = Some("U.S.C.".to_string()),
            "cfr" => fields.code = Some("C.F.R.".to_string()),
            "fed_reg" => fields.code = Some("Fed. Reg.".to_string()),
            _ => {}
        }

        if fields.parties.len() == 1 {
            let parts = split_parties(&fields.parties[0]);
            if parts.len() >= 2 {
                fields.parties = parts;
            }
        }

        self.grade(&mut citation);
        citation
    }

    /// Recompute status and confidence from the current fields
    pub fn grade(&self, citation: &mut Citation) {
        citation.status = status_for(citation);
        citation.confidence_score = confidence_for(citation);
    }
}

/// Fields a citation of this shape cannot be complete without
pub fn required_fields(citation: &Citation) -> Vec<Field> {
    let fields = &citation.fields;
    match (citation.citation_type, citation.short_form) {
        (_, Some(ShortFormKind::Id)) => vec![],
        (_, Some(ShortFormKind::Supra)) => vec![Field::ShortName],
        (CitationType::Case, Some(ShortFormKind::ShortCase)) => {
            vec![Field::ShortName, Field::Volume, Field::Reporter, Field::Pincite]
        }
        (CitationType::Case, _) => vec![Field::Parties, Field::Volume, Field::Reporter, Field::Page],
        (CitationType::Statute, _) if is_code(fields.code.as_deref(), "U.S.C.") => {
            vec![Field::TitleNumber, Field::Code, Field::Section]
        }
        (CitationType::Statute, _) => vec![Field::Code, Field::Section],
        (CitationType::Regulation, _) if is_code(fields.code.as_deref(), "Fed. Reg.") => {
            vec![Field::Volume, Field::Code, Field::Page]
        }
        (CitationType::Regulation, _) => vec![Field::TitleNumber, Field::Section],
        (CitationType::LawReview, _) => vec![
            Field::Author,
            Field::Title,
            Field::Volume,
            Field::Journal,
            Field::Page,
        ],
        (CitationType::Book, _) => vec![Field::Author, Field::Title],
        (CitationType::Website, _) => vec![Field::Url, Field::Title],
        (CitationType::Other, _) => vec![],
    }
}

/// Fields whose absence leaves a citation usable but unverified
pub fn important_fields(citation: &Citation) -> Vec<Field> {
    if citation.short_form.is_some() {
        return vec![];
    }
    match citation.citation_type {
        CitationType::Case => {
            let supreme = citation
                .fields
                .reporter
                .as_deref()
                .map(is_supreme_court_reporter)
                .unwrap_or(false);
            if supreme {
                vec![Field::Year]
            } else {
                vec![Field::Court, Field::Year]
            }
        }
        CitationType::Regulation | CitationType::LawReview | CitationType::Book => {
            vec![Field::Year]
        }
        CitationType::Website => vec![Field::AccessDate],
        CitationType::Statute | CitationType::Other => vec![],
    }
}

pub fn is_supreme_court_reporter(reporter: &str) -> bool {
    let reporter = collapse_whitespace(reporter);
    SUPREME_COURT_REPORTERS.contains(&reporter.as_str())
}

/// Completeness status from the current fields
pub fn status_for(citation: &Citation) -> CitationStatus {
    if is_malformed(citation) {
        return CitationStatus::Malformed;
    }
    if required_fields(citation)
        .iter()
        .any(|f| !citation.fields.has(*f))
    {
        return CitationStatus::Incomplete;
    }
    if citation.citation_type == CitationType::Other && citation.short_form.is_none() {
        return CitationStatus::NeedsVerification;
    }
    if important_fields(citation)
        .iter()
        .any(|f| !citation.fields.has(*f))
    {
        return CitationStatus::NeedsVerification;
    }
    CitationStatus::Complete
}

/// Extraction confidence in [0, 1]
///
/// Weighted sum of grammar specificity, the share of required and
/// important fields present, and the absence of malformed markers.
/// More fields never lower the score.
pub fn confidence_for(citation: &Citation) -> f64 {
    let mut expected = required_fields(citation);
    expected.extend(important_fields(citation));
    let completeness = if expected.is_empty() {
        1.0
    } else {
        let present = expected.iter().filter(|f| citation.fields.has(**f)).count();
        present as f64 / expected.len() as f64
    };

    let malformed = is_malformed(citation);
    let clean = if malformed { 0.0 } else { 1.0 };

    let mut score = SPECIFICITY_WEIGHT * specificity(&citation.pattern)
        + COMPLETENESS_WEIGHT * completeness
        + CLEAN_WEIGHT * clean;
    if malformed {
        score *= MALFORMED_PENALTY;
    }
    if citation.lookup_results.as_ref().map(|r| r.found).unwrap_or(false) {
        score += LOOKUP_BONUS;
    }

    (score.clamp(0.0, 1.0) * 1000.0).round() / 1000.0
}

/// A citation is malformed when the grammar's structure is still broken
/// or a field contradicts its type.
pub fn is_malformed(citation: &Citation) -> bool {
    let fields = &citation.fields;

    if citation
        .structural_gaps
        .iter()
        .any(|gap| !fields.has(*gap))
    {
        return true;
    }

    let numeric = |value: &Option<String>| {
        value
            .as_deref()
            .map(|v| {
                let v = v.trim();
                v.is_empty() || v.chars().all(|c| c.is_ascii_digit())
            })
            .unwrap_or(true)
    };
    if !numeric(&fields.volume) || !numeric(&fields.page) {
        return true;
    }
    if matches!(citation.citation_type, CitationType::Statute | CitationType::Regulation)
        && !numeric(&fields.title_number)
    {
        return true;
    }

    if let Some(year) = fields.year {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return true;
        }
    }

    if let Some(url) = fields.url.as_deref() {
        if !url.trim().is_empty() && Url::parse(url.trim()).is_err() {
            return true;
        }
    }

    false
}

/// Split `A v. B` into its parties
pub fn split_parties(name: &str) -> Vec<String> {
    VERSUS
        .split(name)
        .map(clean_text)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Court and year from a case parenthetical: `(1st Cir. 1993)`
pub fn split_court_year(paren: &str) -> (Option<String>, Option<i32>) {
    let year_match = YEAR.find_iter(paren).last();
    let year = year_match.and_then(|m| m.as_str().parse().ok());

    let court = match year_match {
        Some(m) => format!("{}{}", &paren[..m.start()], &paren[m.end()..]),
        None => paren.to_string(),
    };
    let court = collapse_whitespace(court.trim_matches(|c: char| c == ',' || c.is_whitespace()));

    ((!court.is_empty()).then_some(court), year)
}

/// Publisher or supplement text ahead of the year in a code's date
/// parenthetical: `West 2020` gives `West`
pub fn statute_publisher(value: &str) -> Option<String> {
    let end = YEAR.find_iter(value).last().map(|m| m.start()).unwrap_or(value.len());
    let publisher = collapse_whitespace(&value[..end]);
    (!publisher.is_empty()).then_some(publisher)
}

/// `§1715(b)` as `§ 1715(b)`: sign, one space, then the number
pub fn normalize_locator(value: &str) -> String {
    let rest = value.trim_start_matches(['§', '¶']);
    let sign = &value[..value.len() - rest.len()];
    format!("{} {}", sign, rest.trim())
}

/// Last plausible four-digit year in a string
pub fn parse_year(value: &str) -> Option<i32> {
    YEAR.find_iter(value).last().and_then(|m| m.as_str().parse().ok())
}

fn is_code(code: Option<&str>, expected: &str) -> bool {
    code.map(|c| collapse_whitespace(c) == expected).unwrap_or(false)
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim markup and stray punctuation from a name or title
fn clean_text(value: &str) -> String {
    let trimmed = value.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '*' | '_' | '"' | '“' | '”' | ',' | ';')
    });
    collapse_whitespace(trimmed)
}

/// Website access dates in Bluebook form (`Mar. 5, 2020`); unrecognized
/// dates are kept as written.
pub fn normalize_access_date(value: &str) -> String {
    const FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y", "%b. %d, %Y", "%Y-%m-%d", "%m/%d/%Y"];

    let trimmed = value.trim();
    let candidate = trimmed.replace("Sept.", "Sep.");
    FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(&candidate, f).ok())
        .map(bluebook_date)
        .unwrap_or_else(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LookupResult;

    fn raw(citation_type: CitationType, pattern: &str, fields: &[(&str, &str)]) -> Citation {
        let mut citation = Citation::new(citation_type, "raw", 0, 3, pattern);
        for (name, value) in fields {
            citation = citation.with_raw(name, Some(value));
        }
        citation
    }

    #[test]
    fn test_full_supreme_court_case_is_complete() {
        let citation = Normalizer::new().normalize(raw(
            CitationType::Case,
            "case_full",
            &[
                ("p1", "Brown"),
                ("p2", "Board of Education"),
                ("volume", "347"),
                ("reporter", "U.S."),
                ("page", "483"),
                ("paren", "1954"),
            ],
        ));
        assert_eq!(citation.fields.parties, vec!["Brown", "Board of Education"]);
        assert_eq!(citation.fields.year, Some(1954));
        assert_eq!(citation.fields.court, None);
        assert_eq!(citation.status, CitationStatus::Complete);
        assert!(citation.raw_fields.is_empty());
    }

    #[test]
    fn test_circuit_case_without_court_needs_verification() {
        let citation = Normalizer::new().normalize(raw(
            CitationType::Case,
            "case_full",
            &[
                ("p1", "Smith"),
                ("p2", "Jones"),
                ("volume", "1"),
                ("reporter", "F.3d"),
                ("page", "1"),
                ("paren", "1993"),
            ],
        ));
        assert_eq!(citation.status, CitationStatus::NeedsVerification);
    }

    #[test]
    fn test_court_and_year_split() {
        assert_eq!(
            split_court_year("1st Cir. 1993"),
            (Some("1st Cir.".to_string()), Some(1993))
        );
        assert_eq!(split_court_year("1954"), (None, Some(1954)));
        assert_eq!(split_court_year("S.D.N.Y."), (Some("S.D.N.Y.".to_string()), None));
    }

    #[test]
    fn test_missing_page_is_malformed_and_low_confidence() {
        let mut citation = raw(
            CitationType::Case,
            "case_reporter",
            &[("volume", "347"), ("reporter", "U.S."), ("paren", "1954")],
        );
        citation.structural_gaps.push(Field::Page);
        let citation = Normalizer::new().normalize(citation);
        assert_eq!(citation.status, CitationStatus::Malformed);
        assert!(citation.confidence_score < 0.5);
    }

    #[test]
    fn test_non_numeric_volume_is_malformed() {
        let mut citation = Citation::new(CitationType::Case, "x", 0, 1, "case_full");
        citation.fields.parties = vec!["A".into(), "B".into()];
        citation.fields.volume = Some("XL".into());
        citation.fields.reporter = Some("U.S.".into());
        citation.fields.page = Some("1".into());
        assert_eq!(status_for(&citation), CitationStatus::Malformed);
    }

    #[test]
    fn test_split_parties() {
        assert_eq!(split_parties("Roe vs. Wade"), vec!["Roe", "Wade"]);
        let citation = Normalizer::new().normalize(raw(
            CitationType::Case,
            "manual",
            &[("p1", "Roe v. Wade")],
        ));
        assert_eq!(citation.fields.parties, vec!["Roe", "Wade"]);
    }

    #[test]
    fn test_single_party_caption_is_complete() {
        let citation = Normalizer::new().normalize(raw(
            CitationType::Case,
            "case_single",
            &[
                ("single", "In re  Gault"),
                ("volume", "387"),
                ("reporter", "U.S."),
                ("page", "1"),
                ("paren", "1967"),
            ],
        ));
        assert_eq!(citation.fields.parties, vec!["In re Gault"]);
        assert_eq!(citation.status, CitationStatus::Complete);
    }

    #[test]
    fn test_state_statute_keeps_publisher() {
        let citation = Normalizer::new().normalize(raw(
            CitationType::Statute,
            "state_statute",
            &[("code", "Cal. Civ. Code"), ("section", "1714"), ("year", "West 2020")],
        ));
        assert_eq!(citation.fields.publisher.as_deref(), Some("West"));
        assert_eq!(citation.fields.year, Some(2020));
    }

    #[test]
    fn test_locator_spacing() {
        assert_eq!(normalize_locator("§1715"), "§ 1715");
        assert_eq!(normalize_locator("§§ 12-14"), "§§ 12-14");
        assert_eq!(normalize_locator("¶ 3"), "¶ 3");
    }

    #[test]
    fn test_statute_without_section_is_incomplete() {
        let citation = Normalizer::new().normalize(raw(CitationType::Statute, "usc", &[("title", "42")]));
        assert_eq!(citation.fields.title_number.as_deref(), Some("42"));
        assert_eq!(citation.fields.code.as_deref(), Some("U.S.C."));
        assert_eq!(citation.status, CitationStatus::Incomplete);
    }

    #[test]
    fn test_adding_fields_is_monotone() {
        let normalizer = Normalizer::new();
        let mut citation = normalizer.normalize(raw(
            CitationType::Case,
            "case_name_only",
            &[("p1", "Smith"), ("p2", "Jones")],
        ));
        let mut last = (citation.status, citation.confidence_score);

        let steps: Vec<Box<dyn Fn(&mut Citation)>> = vec![
            Box::new(|c: &mut Citation| c.fields.volume = Some("1".into())),
            Box::new(|c: &mut Citation| c.fields.reporter = Some("F.3d".into())),
            Box::new(|c: &mut Citation| c.fields.page = Some("10".into())),
            Box::new(|c: &mut Citation| c.fields.year = Some(1993)),
            Box::new(|c: &mut Citation| c.fields.court = Some("1st Cir.".into())),
        ];
        for step in steps {
            step(&mut citation);
            normalizer.grade(&mut citation);
            assert!(citation.status >= last.0);
            assert!(citation.confidence_score >= last.1);
            last = (citation.status, citation.confidence_score);
        }
        assert_eq!(citation.status, CitationStatus::Complete);
    }

    #[test]
    fn test_lookup_bonus() {
        let mut citation = Normalizer::new().normalize(raw(
            CitationType::Statute,
            "usc",
            &[("title", "42"), ("section", "1983")],
        ));
        let before = citation.confidence_score;
        citation.lookup_results = Some(LookupResult::found("Cornell LII", Default::default()));
        Normalizer::new().grade(&mut citation);
        assert!(citation.confidence_score > before);
    }

    #[test]
    fn test_access_date_normalized() {
        assert_eq!(normalize_access_date("March 5, 2020"), "Mar. 5, 2020");
        assert_eq!(normalize_access_date("2021-09-14"), "Sept. 14, 2021");
        assert_eq!(normalize_access_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_id_is_complete() {
        let mut citation = Citation::new(CitationType::Other, "Id.", 0, 3, "id");
        citation.short_form = Some(ShortFormKind::Id);
        let citation = Normalizer::new().normalize(citation);
        assert_eq!(citation.status, CitationStatus::Complete);
    }
}
