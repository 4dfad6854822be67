//! Unsourced claim detection
//!
//! Splits prose into sentences, drops every sentence that touches a
//! citation (or sits just before one), and classifies what is left by
//! keyword patterns. Only sentences scoring at or above the configured
//! threshold are reported.

pub mod terms;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ClaimType, UnsourcedClaim};

static STATISTICAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d+(?:\.\d+)?\s*(?:%|percent\b|per cent\b)",
        r"\d+(?:,\d{3})*(?:\.\d+)?\s+(?:people|persons|individuals|cases|claims|incidents|dollars|defendants|plaintiffs)\b",
        r"(?i)\b(?:approximately|about|nearly|over|under|more than|less than|fewer than|at least)\s+\$?\d+",
        r"(?i)\b(?:majority|minority|plurality)\s+of\b",
        r"(?i)\b(?:studies|research|data|surveys|evidence)\s+(?:shows?|indicates?|suggests?|demonstrates?)\b",
        r"(?i)\b(?:twice|half|doubled|tripled|increased|decreased|declined)\b.*\d",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static QUOTATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["\u{201C}][^"\u{201C}\u{201D}]{15,}["\u{201D}]"#).unwrap());

static LEGAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:the|a)\s+(?:supreme\s+)?courts?\s+(?:has\s+|have\s+)?(?:held|ruled|found|determined|concluded|stated)\b",
        r"(?i)\b(?:under|according to|pursuant to)\s+(?:the\s+)?(?:\w+\s+)?(?:law|statute|regulation|rule|doctrine)\b",
        r"(?i)\b(?:test|standard|doctrine|rule|principle)\s+(?:requires|provides|states|holds)\b",
        r"(?i)\b(?:congress|the legislature)\s+(?:has\s+)?(?:enacted|passed|established|created)\b",
        r"(?i)\b(?:the constitution|the \w+ amendment)\s+(?:provides|guarantees|requires|prohibits)\b",
        r"(?i)\b(?:courts|judges|the judiciary)\s+(?:have|has)\s+(?:consistently|uniformly|generally|long)\b",
        r"(?i)\bit is (?:well[- ])?(?:established|settled)\s+(?:law\s+)?that\b",
        r"(?i)\b(?:shall|must not|is liable|are liable|unconstitutional|preempt(?:s|ed)?|violates?)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static FACTUAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bit is (?:a\s+)?(?:well[- ])?(?:known|established|documented)\s+(?:fact\s+)?that\b",
        r"(?i)\bas a matter of fact\b",
        r"(?i)\bhistorically\b",
        r"(?i)\btraditionally\b",
        r"(?i)\bgenerally,?\s+speaking\b",
        r"(?i)\bit is (?:commonly|widely|generally)\s+(?:accepted|believed|understood)\b",
        r"(?i)\b(?:in|since|by)\s+(?:1[6-9]|20)\d{2}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Words that end with a period without ending a sentence
const ABBREVIATIONS: &[&str] = &[
    "v", "vs", "Inc", "Co", "Corp", "Ltd", "No", "Nos", "Mr", "Mrs", "Ms", "Dr", "St", "Jr", "Sr",
    "Id", "id", "al", "cf", "Cf", "e.g", "i.e", "art", "Art", "ch", "cl", "para", "Sec", "sec",
    "Const", "Amend", "Cir", "Dist", "Ct", "App", "Supp", "Stat", "Rev", "Reg", "Fed",
];

fn default_threshold() -> f64 {
    0.5
}

fn default_margin_before() -> usize {
    30
}

fn default_min_sentence_len() -> usize {
    20
}

fn default_max_terms() -> usize {
    5
}

/// Tunables for claim detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSettings {
    /// Minimum confidence for a claim to be reported
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Bytes before a citation whose sentences count as supported
    #[serde(default = "default_margin_before")]
    pub margin_before: usize,

    /// Bytes after a citation whose sentences count as supported
    #[serde(default)]
    pub margin_after: usize,

    /// Shorter sentences are never claims
    #[serde(default = "default_min_sentence_len")]
    pub min_sentence_len: usize,

    #[serde(default = "default_max_terms")]
    pub max_terms: usize,
}

impl Default for ClaimSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            margin_before: default_margin_before(),
            margin_after: 0,
            min_sentence_len: default_min_sentence_len(),
            max_terms: default_max_terms(),
        }
    }
}

/// Keyword hits per category for one sentence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub statistical: usize,
    pub quotation: usize,
    pub legal: usize,
    pub factual: usize,
}

impl Signals {
    pub fn scan(sentence: &str) -> Self {
        let count = |patterns: &[Regex]| patterns.iter().filter(|p| p.is_match(sentence)).count();
        Self {
            statistical: count(STATISTICAL_PATTERNS.as_slice()),
            quotation: QUOTATION_PATTERN.find_iter(sentence).count(),
            legal: count(LEGAL_PATTERNS.as_slice()),
            factual: count(FACTUAL_PATTERNS.as_slice()),
        }
    }

    pub fn total(&self) -> usize {
        self.statistical + self.quotation + self.legal + self.factual
    }

    /// Statistical, then quotation, then legal, then factual
    pub fn classify(&self) -> Option<ClaimType> {
        if self.statistical > 0 {
            Some(ClaimType::Statistical)
        } else if self.quotation > 0 {
            Some(ClaimType::Quotation)
        } else if self.legal > 0 {
            Some(ClaimType::Legal)
        } else if self.factual > 0 {
            Some(ClaimType::Factual)
        } else {
            None
        }
    }
}

/// Finds sentences that read like they need a citation
#[derive(Debug, Clone, Default)]
pub struct ClaimDetector {
    settings: ClaimSettings,
}

impl ClaimDetector {
    pub fn new(settings: ClaimSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ClaimSettings {
        &self.settings
    }

    /// Detect claims outside the given citation spans, in document order
    pub fn detect(&self, text: &str, citation_spans: &[(usize, usize)]) -> Vec<UnsourcedClaim> {
        let mut claims = Vec::new();
        if text.trim().is_empty() {
            return claims;
        }

        let sentences = split_sentences(text, citation_spans);
        for (start, end) in &sentences {
            let (start, end) = (*start, *end);
            if self.near_citation(start, end, citation_spans) {
                continue;
            }
            let sentence = &text[start..end];
            if sentence.chars().count() < self.settings.min_sentence_len {
                continue;
            }

            let signals = Signals::scan(sentence);
            let Some(claim_type) = signals.classify() else {
                continue;
            };
            let confidence = confidence_for(claim_type, &signals, sentence);
            if confidence < self.settings.threshold {
                continue;
            }

            let terms = terms::search_terms(sentence, claim_type, self.settings.max_terms);
            claims.push(UnsourcedClaim::new(
                sentence,
                start,
                end,
                claim_type,
                confidence,
                terms,
            ));
        }

        debug!(
            sentences = sentences.len(),
            claims = claims.len(),
            "Detected unsourced claims"
        );
        claims
    }

    fn near_citation(&self, start: usize, end: usize, spans: &[(usize, usize)]) -> bool {
        spans.iter().any(|&(cs, ce)| {
            let window_start = cs.saturating_sub(self.settings.margin_before);
            let window_end = ce + self.settings.margin_after;
            start < window_end && window_start < end
        })
    }
}

fn base_confidence(claim_type: ClaimType) -> f64 {
    match claim_type {
        ClaimType::Statistical => 0.6,
        ClaimType::Quotation => 0.65,
        ClaimType::Legal => 0.55,
        ClaimType::Factual => 0.45,
    }
}

/// Base score for the type, raised by extra keyword hits, nudged by length
pub fn confidence_for(claim_type: ClaimType, signals: &Signals, sentence: &str) -> f64 {
    let words = sentence.split_whitespace().count();
    let extra_hits = signals.total().saturating_sub(1) as f64;
    let density = (extra_hits * 0.08).min(0.2);
    let length = match words {
        0..=5 => -0.1,
        6..=40 => 0.05,
        41..=60 => 0.0,
        _ => -0.05,
    };
    let score = (base_confidence(claim_type) + density + length).clamp(0.0, 1.0);
    (score * 1000.0).round() / 1000.0
}

/// Sentence spans (trimmed) with citation spans kept whole
pub fn split_sentences(text: &str, citation_spans: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();

    let inside_citation =
        |i: usize| citation_spans.iter().any(|&(s, e)| s <= i && i < e);

    for (i, c) in text.char_indices() {
        if i < start || inside_citation(i) {
            continue;
        }

        let boundary = match c {
            '\n' if text[i + 1..].starts_with('\n') || text[i + 1..].starts_with("\r\n") => {
                Some(i)
            }
            '.' | '!' | '?' => {
                let mut j = i + 1;
                while j < bytes.len() && matches!(bytes[j], b'"' | b'\'' | b')' | b']') {
                    j += 1;
                }
                let rest = &text[j..];
                let next = rest.trim_start().chars().next();
                let ends = rest.is_empty()
                    || (rest.starts_with(char::is_whitespace)
                        && next.map(|n| !n.is_lowercase()).unwrap_or(true));
                if ends && !(c == '.' && is_abbreviation(&text[start..i])) {
                    Some(j)
                } else {
                    None
                }
            }
            _ => None,
        };

        if let Some(end) = boundary {
            push_trimmed(text, start, end, &mut sentences);
            start = end;
        }
    }
    push_trimmed(text, start, text.len(), &mut sentences);
    sentences
}

fn push_trimmed(text: &str, start: usize, end: usize, out: &mut Vec<(usize, usize)>) {
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trail = slice.len() - slice.trim_end().len();
    if lead + trail < slice.len() {
        out.push((start + lead, end - trail));
    }
}

/// Whether the word ending `before` (the text up to a period) is an
/// abbreviation or an initial
fn is_abbreviation(before: &str) -> bool {
    let word = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(['(', '[', '"', '\u{201C}']);
    if word.is_empty() {
        return false;
    }
    if word.chars().count() == 1 && word.chars().all(char::is_uppercase) {
        return true;
    }
    word.contains('.') || ABBREVIATIONS.contains(&word)
}
