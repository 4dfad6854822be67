//! Pattern library: one compiled grammar per citation shape.
//!
//! Grammars are built from shared fragments so party names, reporters and
//! pincites read the same way everywhere. Whitespace between numeric
//! fields is `\s+` (line wraps allowed); everywhere else it is `[ \t]+`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{CitationType, ShortFormKind};

/// One capitalised party word followed by up to five more words
const PARTY: &str = r"\p{Lu}[\p{L}.'&-]*(?:[ \t]+[\p{L}.'&-]+){0,5}";

/// Single-party captions: `In re Gault`, `Ex parte Milligan`
const CAPTION: &str = r"\b(?:In[ \t]+re|Ex[ \t]+parte)[ \t]+\p{Lu}[\p{L}.'&-]*(?:[ \t]+[\p{L}.'&-]+){0,4}";

/// Reporter abbreviation: first token carries a period (`U.S.`, `F.3d`,
/// `S. Ct.`), later tokens are capitalised or series markers (`2d`).
const REPORTER: &str =
    r"[A-Z][A-Za-z0-9']*\.[A-Za-z0-9.']*(?:[ \t]+(?:[A-Z][A-Za-z0-9.']*|\d{1,2}[a-z]{1,2}\.?)){0,3}";

const PIN: &str = r"\d{1,5}(?:[ \t]*[-–—][ \t]*\d{1,5})?";

const PAREN: &str = r"\((?P<paren>[^()\n]{0,60})\)";

const AUTHOR: &str =
    r"\p{Lu}[\p{L}.'-]*(?:[ \t]+(?:\p{Lu}[\p{L}.'-]*|&|and|de|van|von|et[ \t]+al\.)){0,6}";

const JOURNAL: &str = r"(?:[A-Z][A-Za-z.'&]*[ \t]+|&[ \t]+){0,5}(?:L\.[ \t]?Rev\.|L\.[ \t]?J\.|Rev\.|J\.|L\.|Law[ \t]+Review|Law[ \t]+Journal|Review|Journal)";

/// Capitalised words, with short connectors between them (`Law of Everything`)
const SHORT_NAME: &str =
    r"\p{Lu}[\p{L}.'&-]*(?:[ \t]+(?:(?:of|the|and|for|on|to)[ \t]+)?\p{Lu}[\p{L}.'&-]*){0,3}";

/// Section or paragraph locator after `Id.`
const LOCATOR: &str = r"(?:§{1,2}|¶{1,2})[ \t]*\d+[A-Za-z]?(?:[-.:]\d+)*[A-Za-z]?";

const URL: &str = r#"https?://[^\s<>"'()\[\]]*[^\s<>"'()\[\].,;:!?]"#;

const SUBSECTIONS: &str = r"(?:\((?:[a-z]{1,4}|[0-9]{1,3}|[ivxA-Z]{1,5})\))*";

/// Words after which a party name or author starts when scanning back
/// from the end of a greedy name match
pub const BOUNDARY_WORDS: &[&str] = &[
    "in", "see", "but", "cf.", "compare", "e.g.", "accord", "held", "ruled", "found", "stated",
    "noted", "concluded",
];

/// Longest party name kept when scanning back from `v.`
const MAX_PARTY_WORDS: usize = 6;

/// An existing `[hereinafter X]` designation right after a citation
pub static HEREINAFTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*,?[ \t]*\[hereinafter[ \t]+(?P<name>[^\]\n]{1,80})\]").unwrap()
});

/// Citation signals and narrative words that a leftmost match can swallow
/// in front of a party name or author
pub const LEADING_NOISE: &[&str] = &[
    "see", "also", "but", "cf.", "compare", "accord", "e.g.", "e.g.,", "contra", "in", "the",
    "a", "an", "and", "with", "that", "later", "thus", "held", "ruled", "found", "stated",
    "noted", "concluded", "under", "as", "per",
];

/// A compiled citation grammar
#[derive(Debug)]
pub struct CitationPattern {
    pub name: &'static str,
    pub citation_type: CitationType,
    pub short_form: Option<ShortFormKind>,
    /// How distinctive a match of this grammar is, in [0, 1]
    pub specificity: f64,
    pub regex: Regex,
}

fn compile(
    name: &'static str,
    citation_type: CitationType,
    short_form: Option<ShortFormKind>,
    specificity: f64,
    pattern: String,
) -> CitationPattern {
    let regex = Regex::new(&pattern).unwrap_or_else(|e| panic!("pattern {name}: {e}"));
    CitationPattern {
        name,
        citation_type,
        short_form,
        specificity,
        regex,
    }
}

/// Every grammar, in no particular order. Overlaps are settled later by
/// the extractor's tie-break, not by position in this list.
pub static PATTERNS: Lazy<Vec<CitationPattern>> = Lazy::new(|| {
    vec![
        compile(
            "case_full",
            CitationType::Case,
            None,
            0.95,
            format!(
                r"(?P<p1>{PARTY})[ \t]+vs?\.[ \t]+(?P<p2>{PARTY}),[ \t]*(?P<volume>\d{{1,4}})\s+(?P<reporter>{REPORTER})(?:\s+(?P<page>\d{{1,5}}))?(?:,\s*(?P<pin>{PIN}))?(?:\s*{PAREN})?"
            ),
        ),
        compile(
            "case_single",
            CitationType::Case,
            None,
            0.9,
            format!(
                r"(?P<single>{CAPTION}),[ \t]*(?P<volume>\d{{1,4}})\s+(?P<reporter>{REPORTER})(?:\s+(?P<page>\d{{1,5}}))?(?:,\s*(?P<pin>{PIN}))?(?:\s*{PAREN})?"
            ),
        ),
        compile(
            "case_name_only",
            CitationType::Case,
            None,
            0.55,
            format!(r"(?P<p1>{PARTY})[ \t]+vs?\.[ \t]+(?P<p2>{PARTY})"),
        ),
        compile(
            "case_reporter",
            CitationType::Case,
            None,
            0.7,
            format!(
                r"(?P<volume>\b\d{{1,4}})\s+(?P<reporter>{REPORTER})(?:\s+(?P<page>\d{{1,5}}))?(?:,\s*(?P<pin>{PIN}))?(?:\s*{PAREN})?"
            ),
        ),
        compile(
            "case_short",
            CitationType::Case,
            Some(ShortFormKind::ShortCase),
            0.85,
            format!(
                r"(?P<name>{SHORT_NAME}),[ \t]*(?P<volume>\d{{1,4}})\s+(?P<reporter>{REPORTER})\s+at\s+(?P<pin>{PIN})"
            ),
        ),
        compile(
            "usc",
            CitationType::Statute,
            None,
            0.9,
            format!(
                r"(?:(?P<title>\b\d{{1,3}})\s+)?U\.[ \t]?S\.[ \t]?C\.(?:[ \t]?A\.)?(?:\s*§{{1,2}}\s*(?P<section>\d+[A-Za-z]?(?:-\d+[A-Za-z]?)?)(?P<subsection>{SUBSECTIONS}))?(?:\s*\((?P<year>(?:[A-Za-z.]+[ \t]+)*\d{{4}})\))?"
            ),
        ),
        compile(
            "state_statute",
            CitationType::Statute,
            None,
            0.8,
            format!(
                r"(?P<code>(?:[A-Z][A-Za-z.']*[ \t]+){{1,4}}(?:Code|Stat\.|Laws?)(?:[ \t]+Ann\.)?)[ \t]*§{{1,2}}[ \t]*(?P<section>\d+(?:[-.:]\d+)*[A-Za-z]?)(?P<subsection>{SUBSECTIONS})(?:\s*\((?P<year>(?:[A-Za-z.]+[ \t]+)*\d{{4}})\))?"
            ),
        ),
        compile(
            "cfr",
            CitationType::Regulation,
            None,
            0.9,
            format!(
                r"(?P<title>\b\d{{1,3}})\s+C\.[ \t]?F\.[ \t]?R\.(?:\s*(?:§{{1,2}}|[Pp]t\.|[Pp]art)\s*(?P<section>\d+(?:\.\d+)*[a-z]?)(?P<subsection>{SUBSECTIONS}))?(?:\s*\((?P<year>\d{{4}})\))?"
            ),
        ),
        compile(
            "fed_reg",
            CitationType::Regulation,
            None,
            0.9,
            format!(
                r"(?P<volume>\b\d{{1,3}})\s+Fed\.[ \t]?Reg\.\s+(?P<page>\d{{1,3}}(?:,\d{{3}})*|\d{{1,7}})(?:,\s*(?P<pin>{PIN}))?(?:\s*\((?P<date>[^()\n]{{0,30}}?(?P<year>\d{{4}}))\))?"
            ),
        ),
        compile(
            "law_review",
            CitationType::LawReview,
            None,
            0.85,
            format!(
                r"(?P<author>{AUTHOR}),[ \t]+(?P<title>[^,\n]{{3,200}}?),\s+(?P<volume>\d{{1,4}})\s+(?P<journal>{JOURNAL})\s+(?P<page>\d{{1,5}})(?:,\s*(?P<pin>{PIN}))?(?:\s*\((?P<year>\d{{4}})\))?"
            ),
        ),
        compile(
            "book",
            CitationType::Book,
            None,
            0.7,
            format!(
                r"(?P<author>{AUTHOR}),[ \t]+(?P<title>[A-Z][^()\n,]{{2,150}}?)(?:[ \t]+(?P<pin>{PIN}))?[ \t]*\((?:(?P<edition>\d{{1,2}}(?:st|nd|rd|th|d))[ \t]+ed\.[ \t]*)?(?:(?P<publisher>[A-Z][^()\d\n]{{0,60}}?)[ \t]+)?(?P<year>\d{{4}})\)"
            ),
        ),
        compile(
            "website",
            CitationType::Website,
            None,
            0.75,
            format!(
                r"(?:\*(?P<title>[^*\n]{{2,150}})\*,[ \t]+)?(?P<url>{URL})(?:[ \t]*\(last[ \t]+visited[ \t]+(?P<access>[^()\n]{{3,30}})\))?"
            ),
        ),
        compile(
            "id",
            CitationType::Other,
            Some(ShortFormKind::Id),
            0.9,
            format!(
                r"\b[Ii]d\.(?:,?[ \t]+at[ \t]+(?P<pin>{PIN})|[ \t]+(?P<locator>{LOCATOR}{SUBSECTIONS}))?"
            ),
        ),
        compile(
            "supra",
            CitationType::Other,
            Some(ShortFormKind::Supra),
            0.85,
            format!(
                r"(?P<name>{SHORT_NAME})\*?,?[ \t]+supra(?:[ \t]+note[ \t]+(?P<note>\d{{1,3}}))?(?:,?[ \t]+at[ \t]+(?P<pin>{PIN}))?"
            ),
        ),
    ]
});

/// Look up a grammar by name
pub fn pattern(name: &str) -> Option<&'static CitationPattern> {
    PATTERNS.iter().find(|p| p.name == name)
}

/// Specificity of a named grammar; unknown names (hand-built citations)
/// get a middling score.
pub fn specificity(name: &str) -> f64 {
    pattern(name).map(|p| p.specificity).unwrap_or(0.5)
}

/// Reporters that are really code or journal names and must not start a case
pub fn is_code_abbreviation(reporter: &str) -> bool {
    let compact: String = reporter.chars().filter(|c| !c.is_whitespace()).collect();
    matches!(
        compact.as_str(),
        "U.S.C." | "U.S.C.A." | "C.F.R." | "Fed.Reg." | "Stat." | "Pub.L."
    ) || compact.ends_with("Rev.")
        || compact.ends_with("L.J.")
        || compact.ends_with("L.")
}

/// Byte offset where meaningful text begins once leading signals and
/// narrative words are skipped. Also cuts at the last sentence break.
pub fn skip_leading_noise(text: &str) -> usize {
    name_start(text, None)
}

/// Like `skip_leading_noise`, for the party in front of `v.`: keeps at most
/// the last six words.
///
/// `The Court in Roe` gives `Roe`.
pub fn party_start(text: &str) -> usize {
    name_start(text, Some(MAX_PARTY_WORDS))
}

/// Scan back from the end of the name to the nearest sentence break or
/// boundary word, then drop signals and lowercase words in front.
fn name_start(text: &str, max_words: Option<usize>) -> usize {
    let words = word_offsets(text);
    let mut start_word = 0;

    for i in (0..words.len()).rev() {
        let word = words[i].1;
        let lower = word.to_lowercase();
        let bare = lower.trim_end_matches([',', ';', ':']);

        if i + 1 < words.len() && word.ends_with('.') && !looks_like_abbreviation(word) {
            start_word = i + 1;
            break;
        }
        if i + 1 < words.len() && BOUNDARY_WORDS.contains(&bare) {
            start_word = i + 1;
            break;
        }
        if max_words.map(|max| words.len() - i > max).unwrap_or(false) {
            start_word = i + 1;
            break;
        }
    }

    while start_word < words.len() {
        let lower = words[start_word].1.to_lowercase();
        let lower = lower.trim_end_matches(',');
        if LEADING_NOISE.contains(&lower) || !starts_upper(words[start_word].1) {
            start_word += 1;
        } else {
            break;
        }
    }

    words
        .get(start_word)
        .map(|&(offset, _)| offset)
        .unwrap_or(text.len())
}

/// Byte length of a trailing party name once narrative words are cut
///
/// `Jones was decided in 1990` keeps `Jones`. Lowercase connectors inside
/// names (`Board of Education`) are kept when a capitalised word follows.
pub fn trailing_name_len(text: &str) -> usize {
    const CONNECTORS: &[&str] = &["of", "the", "and", "for", "de", "ex", "rel.", "&", "in", "on"];

    let words = word_offsets(text);
    let mut end = 0;

    for &(offset, word) in &words {
        if starts_upper(word) {
            end = offset + word.len();
        } else if !CONNECTORS.contains(&word) {
            break;
        }
    }

    if end == 0 {
        text.len()
    } else {
        end
    }
}

fn word_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c == ' ' || c == '\t' || c == '\n' || c == '\r' {
            if let Some(s) = start.take() {
                words.push((s, &text[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        words.push((s, &text[s..]));
    }
    words
}

fn starts_upper(word: &str) -> bool {
    word.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

fn looks_like_abbreviation(word: &str) -> bool {
    const KNOWN: &[&str] = &["Inc.", "Corp.", "Co.", "Ltd.", "Bros.", "Ass'n", "Dep't"];
    KNOWN.contains(&word)
        || word.len() <= 4
        || word[..word.len() - 1].contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(name: &str, text: &'a str) -> Option<&'a str> {
        pattern(name)
            .and_then(|p| p.regex.find(text))
            .map(|m| m.as_str())
    }

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(PATTERNS.len(), 14);
        for p in PATTERNS.iter() {
            assert!(p.specificity > 0.0 && p.specificity <= 1.0, "{}", p.name);
        }
    }

    #[test]
    fn test_case_full_with_circuit() {
        let text = "Smith v. Jones, 1 F.3d 1 (1st Cir. 1993)";
        assert_eq!(find("case_full", text), Some(text));
    }

    #[test]
    fn test_case_full_multiword_reporter() {
        let caps = pattern("case_full")
            .and_then(|p| p.regex.captures("Doe v. Roe, 12 F. Supp. 2d 345, 350 (S.D.N.Y. 1998)"))
            .unwrap();
        assert_eq!(&caps["reporter"], "F. Supp. 2d");
        assert_eq!(&caps["page"], "345");
        assert_eq!(&caps["pin"], "350");
    }

    #[test]
    fn test_reporter_allows_line_wrap_in_numbers() {
        let text = "Brown v. Board, 347\nU.S. 483 (1954)";
        assert_eq!(find("case_full", text), Some(text));
    }

    #[test]
    fn test_short_case() {
        assert_eq!(
            find("case_short", "Brown, 347 U.S. at 490."),
            Some("Brown, 347 U.S. at 490")
        );
    }

    #[test]
    fn test_usc_subsections() {
        let caps = pattern("usc")
            .and_then(|p| p.regex.captures("42 U.S.C. § 1983(a)(1) (2018)"))
            .unwrap();
        assert_eq!(&caps["title"], "42");
        assert_eq!(&caps["section"], "1983");
        assert_eq!(&caps["subsection"], "(a)(1)");
        assert_eq!(&caps["year"], "2018");
    }

    #[test]
    fn test_state_statute() {
        assert_eq!(
            find("state_statute", "under Cal. Civ. Code § 1714 liability"),
            Some("Cal. Civ. Code § 1714")
        );
    }

    #[test]
    fn test_law_review() {
        let text = "Cass R. Sunstein, On the Expressive Function of Law, 144 U. Pa. L. Rev. 2021, 2025 (1996)";
        let caps = pattern("law_review").and_then(|p| p.regex.captures(text)).unwrap();
        assert_eq!(&caps["author"], "Cass R. Sunstein");
        assert_eq!(&caps["journal"], "U. Pa. L. Rev.");
        assert_eq!(&caps["year"], "1996");
    }

    #[test]
    fn test_book_with_edition() {
        let text = "Richard A. Posner, Economic Analysis of Law 25 (9th ed. 2014)";
        let caps = pattern("book").and_then(|p| p.regex.captures(text)).unwrap();
        assert_eq!(&caps["title"], "Economic Analysis of Law");
        assert_eq!(&caps["pin"], "25");
        assert_eq!(&caps["edition"], "9th");
        assert_eq!(&caps["year"], "2014");
    }

    #[test]
    fn test_url_trailing_punctuation() {
        assert_eq!(
            find("website", "Visit https://example.com/page."),
            Some("https://example.com/page")
        );
    }

    #[test]
    fn test_id_and_supra() {
        assert_eq!(find("id", "Id. at 495."), Some("Id. at 495"));
        assert_eq!(find("id", "He did."), None);
        assert_eq!(
            find("supra", "Sunstein, supra note 3, at 12."),
            Some("Sunstein, supra note 3, at 12")
        );
    }

    #[test]
    fn test_skip_leading_noise() {
        let text = "See also Smith";
        assert_eq!(&text[skip_leading_noise(text)..], "Smith");
        let text = "The court agreed. Brown";
        assert_eq!(&text[skip_leading_noise(text)..], "Brown");
        let text = "Board of Education";
        assert_eq!(skip_leading_noise(text), 0);
    }

    #[test]
    fn test_party_start_scans_back_from_versus() {
        let text = "The Court in Roe";
        assert_eq!(&text[party_start(text)..], "Roe");
        let text = "Consider the holding in Miranda";
        assert_eq!(&text[party_start(text)..], "Miranda");
        let text = "United States ex rel. Smith";
        assert_eq!(party_start(text), 0);
        let text = "Then one two three four five Six";
        assert_eq!(&text[party_start(text)..], "Six");
    }

    #[test]
    fn test_single_party_caption() {
        assert_eq!(
            find("case_single", "See In re Gault, 387 U.S. 1 (1967)."),
            Some("In re Gault, 387 U.S. 1 (1967)")
        );
        assert_eq!(
            find("case_single", "Ex parte Milligan, 71 U.S. 2 (1866)"),
            Some("Ex parte Milligan, 71 U.S. 2 (1866)")
        );
    }

    #[test]
    fn test_id_with_section_locator() {
        let caps = pattern("id")
            .and_then(|p| p.regex.captures("Id. § 1715(b)."))
            .unwrap();
        assert_eq!(&caps[0], "Id. § 1715(b)");
        assert_eq!(&caps["locator"], "§ 1715(b)");
        assert_eq!(find("id", "Id. ¶ 12."), Some("Id. ¶ 12"));
    }

    #[test]
    fn test_non_ascii_party_names() {
        let text = "Ünïcode v. Tëst, 5 F.3d 9 (1st Cir. 1995)";
        assert_eq!(find("case_full", text), Some(text));
    }

    #[test]
    fn test_hereinafter_designation() {
        let caps = HEREINAFTER.captures(" [hereinafter *Law of Everything*]. Next").unwrap();
        assert_eq!(&caps["name"], "*Law of Everything*");
        assert!(HEREINAFTER.captures(" and then [hereinafter X]").is_none());
        assert_eq!(
            find("supra", "*Law of Everything*, supra note 2, at 9."),
            Some("Law of Everything*, supra note 2, at 9")
        );
    }

    #[test]
    fn test_trailing_name_len() {
        let text = "Jones was decided in 1990";
        assert_eq!(&text[..trailing_name_len(text)], "Jones");
        let text = "Board of Education";
        assert_eq!(trailing_name_len(text), text.len());
    }

    #[test]
    fn test_code_abbreviations_are_not_reporters() {
        assert!(is_code_abbreviation("U.S.C."));
        assert!(is_code_abbreviation("C.F.R."));
        assert!(is_code_abbreviation("Harv. L. Rev."));
        assert!(!is_code_abbreviation("U.S."));
        assert!(!is_code_abbreviation("F. Supp. 2d"));
    }
}
