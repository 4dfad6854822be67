//! Short-form resolution
//!
//! One pass over the citations in document order. Each citation is
//! attributed to an authority, and the authority's history decides the
//! form:
//! - first reference: full citation
//! - same authority as the immediately preceding citation: `Id.`
//! - cited earlier with other authorities in between: supra (or the case
//!   short form when enabled)
//!
//! All history lives in a local `History` built for the pass, so running
//! the resolver twice on the same sequence gives the same suggestions.

use std::collections::HashMap;

use tracing::debug;

use crate::core::AnalysisError;
use crate::domain::{Citation, CitationType, ShortFormKind, ShortFormSuggestion, ShortFormType};
use crate::format::rules::close_up;
use crate::format::{author_surname, CitationForm, Formatter};

/// Titles longer than this earn a hereinafter designation
const HEREINAFTER_TITLE_LEN: usize = 60;

const GENERIC_TITLE_WORDS: &[&str] = &[
    "report", "note", "comment", "restatement", "memorandum", "guidance", "statement", "letter",
];

/// Normalized identity of a logical source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthorityKey(String);

impl AuthorityKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn unresolved(citation: &Citation) -> Self {
        AuthorityKey(format!("unresolved:{}", citation.id))
    }
}

/// Where an authority stands in the pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityState {
    Unseen,
    CitedFull,
    CitedShort,
}

#[derive(Debug, Clone)]
struct Authority {
    /// Index of the first (full) citation
    first: usize,
    /// Index of the most recent citation
    last: usize,
    state: AuthorityState,
    hereinafter: Option<String>,
}

/// Per-pass lookup tables from names and reporter cites to authorities
#[derive(Default)]
struct History {
    keys: Vec<AuthorityKey>,
    authorities: HashMap<AuthorityKey, Authority>,
    by_name: HashMap<String, Vec<(Option<u32>, AuthorityKey)>>,
    by_reporter: HashMap<(String, String), Vec<(AuthorityKey, Vec<String>)>>,
    by_cite: HashMap<(String, String, String), AuthorityKey>,
}

impl History {
    fn state(&self, key: &AuthorityKey) -> AuthorityState {
        self.authorities
            .get(key)
            .map(|a| a.state)
            .unwrap_or(AuthorityState::Unseen)
    }

    fn index_name(&mut self, name: &str, footnote: Option<u32>, key: &AuthorityKey) {
        let name = normalize_name(name);
        if name.is_empty() {
            return;
        }
        self.by_name
            .entry(name)
            .or_default()
            .push((footnote, key.clone()));
    }

    /// Most recent authority known by `name`, preferring one first cited
    /// in footnote `note`
    fn find_by_name(&self, name: &str, note: Option<u32>) -> Option<AuthorityKey> {
        let entries = self.by_name.get(&normalize_name(name))?;
        note.and_then(|n| {
            entries
                .iter()
                .rev()
                .find(|(footnote, _)| *footnote == Some(n))
                .map(|(_, key)| key.clone())
        })
        .or_else(|| entries.last().map(|(_, key)| key.clone()))
    }

    fn find_by_reporter(&self, volume: &str, reporter: &str, name: Option<&str>) -> Option<AuthorityKey> {
        let entries = self
            .by_reporter
            .get(&(volume.trim().to_string(), close_up(reporter)))?;
        let name = name.map(normalize_name).unwrap_or_default();
        entries
            .iter()
            .rev()
            .find(|(_, parties)| {
                parties
                    .iter()
                    .any(|p| *p == name || p.starts_with(&format!("{} ", name)))
            })
            .or_else(|| entries.last())
            .map(|(key, _)| key.clone())
    }
}

/// Computes one short-form suggestion per citation
#[derive(Debug, Clone, Default)]
pub struct ShortFormResolver {
    formatter: Formatter,
    case_short_form: bool,
}

impl ShortFormResolver {
    pub fn new(formatter: Formatter) -> Self {
        Self {
            formatter,
            case_short_form: false,
        }
    }

    /// Render repeat case citations as `*Brown*, 347 U.S. at 490.`
    /// instead of supra
    pub fn with_case_short_form(mut self, enabled: bool) -> Self {
        self.case_short_form = enabled;
        self
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Resolve the whole sequence. Fails only when the sequence is not in
    /// strictly ascending, non-overlapping document order.
    pub fn resolve(&self, citations: &[Citation]) -> Result<Vec<ShortFormSuggestion>, AnalysisError> {
        validate_order(citations)?;

        let mut history = History::default();
        let mut suggestions = Vec::with_capacity(citations.len());

        for (i, citation) in citations.iter().enumerate() {
            let key = self.authority_key(citation, &history);
            let previous = history.authorities.get(&key).cloned();

            let mut suggestion = match previous {
                None => {
                    let hereinafter = self.hereinafter(citation);
                    history.authorities.insert(
                        key.clone(),
                        Authority {
                            first: i,
                            last: i,
                            state: AuthorityState::CitedFull,
                            hereinafter: hereinafter.clone(),
                        },
                    );
                    self.register(citation, &key, hereinafter.as_deref(), &mut history);
                    self.first_reference(citation, &key, hereinafter)
                }
                Some(authority) => {
                    let suggestion = if authority.last + 1 == i {
                        self.id_form(citation, &citations[authority.last], &key)
                    } else {
                        self.later_form(citation, citations, &authority, &key)
                    };
                    debug!(
                        citation = %citation.id,
                        form = suggestion.short_form_type.as_str(),
                        state = ?history.state(&key),
                        "Resolved repeat citation"
                    );
                    if let Some(entry) = history.authorities.get_mut(&key) {
                        entry.last = i;
                        entry.state = AuthorityState::CitedShort;
                    }
                    suggestion
                }
            };

            suggestion.string_cite = i > 0
                && citation.footnote_number.is_some()
                && citations[i - 1].footnote_number == citation.footnote_number
                && history.keys.last() != Some(&key);

            history.keys.push(key);
            suggestions.push(suggestion);
        }

        Ok(suggestions)
    }

    fn first_reference(
        &self,
        citation: &Citation,
        key: &AuthorityKey,
        hereinafter: Option<String>,
    ) -> ShortFormSuggestion {
        let mut suggested_form = self.formatter.format(citation, &CitationForm::Full);
        if let Some(name) = &hereinafter {
            let body = suggested_form.trim_end_matches('.');
            suggested_form = format!("{} [hereinafter {}].", body, name);
        }

        let explanation = if citation.is_short_form() {
            "No earlier citation to attach this short form to; give the full citation".to_string()
        } else {
            "Full citation — first reference to this authority".to_string()
        };

        ShortFormSuggestion {
            citation_id: citation.id.clone(),
            short_form_type: ShortFormType::None,
            suggested_form,
            explanation,
            authority: key.as_str().to_string(),
            hereinafter,
            string_cite: false,
        }
    }

    fn id_form(&self, citation: &Citation, previous: &Citation, key: &AuthorityKey) -> ShortFormSuggestion {
        let pincite = citation
            .fields
            .pincite
            .filter(|pin| previous.fields.pincite != Some(*pin));
        let previous_locator = previous.fields.locator.clone().or_else(|| {
            previous.fields.section.as_ref().map(|section| {
                format!("§ {}{}", section, previous.fields.subsection.as_deref().unwrap_or(""))
            })
        });
        let locator = citation
            .fields
            .locator
            .clone()
            .filter(|l| Some(l) != previous_locator.as_ref());

        ShortFormSuggestion {
            citation_id: citation.id.clone(),
            short_form_type: ShortFormType::Id,
            suggested_form: self.formatter.format(citation, &CitationForm::Id { pincite, locator }),
            explanation: "Id. — same source as immediately preceding citation".to_string(),
            authority: key.as_str().to_string(),
            hereinafter: None,
            string_cite: false,
        }
    }

    fn later_form(
        &self,
        citation: &Citation,
        citations: &[Citation],
        authority: &Authority,
        key: &AuthorityKey,
    ) -> ShortFormSuggestion {
        let first = &citations[authority.first];
        let latest = &citations[authority.last];
        let pincite = citation.fields.pincite;

        if self.case_short_form && first.citation_type == CitationType::Case {
            let source = if citation.fields.volume.is_some() && citation.fields.reporter.is_some() {
                citation
            } else {
                first
            };
            return ShortFormSuggestion {
                citation_id: citation.id.clone(),
                short_form_type: ShortFormType::ShortCase,
                suggested_form: self
                    .formatter
                    .format(source, &CitationForm::ShortCase { pincite }),
                explanation: "Short form — case cited earlier with other authorities in between (Rule 10.9)"
                    .to_string(),
                authority: key.as_str().to_string(),
                hereinafter: None,
                string_cite: false,
            };
        }

        let name = match &authority.hereinafter {
            Some(name) => name.clone(),
            None => self.formatter.short_name(first),
        };
        let note = latest.footnote_number;
        let explanation = match note {
            Some(n) => format!("Supra — authority last cited in note {}; other citations intervene", n),
            None => "Supra — authority cited earlier; other citations intervene".to_string(),
        };

        ShortFormSuggestion {
            citation_id: citation.id.clone(),
            short_form_type: ShortFormType::Supra,
            suggested_form: self
                .formatter
                .format(citation, &CitationForm::Supra { name, note, pincite }),
            explanation,
            authority: key.as_str().to_string(),
            hereinafter: None,
            string_cite: false,
        }
    }

    /// Attribute a citation to its authority
    fn authority_key(&self, citation: &Citation, history: &History) -> AuthorityKey {
        let fields = &citation.fields;
        let resolved = match citation.short_form {
            Some(ShortFormKind::Id) => history.keys.last().cloned(),
            Some(ShortFormKind::Supra) => fields
                .short_name
                .as_deref()
                .and_then(|name| history.find_by_name(name, fields.note_reference)),
            Some(ShortFormKind::ShortCase) => match (&fields.volume, &fields.reporter) {
                (Some(volume), Some(reporter)) => {
                    history.find_by_reporter(volume, reporter, fields.short_name.as_deref())
                }
                _ => None,
            },
            None => Some(self.full_key(citation, history)),
        };
        resolved.unwrap_or_else(|| AuthorityKey::unresolved(citation))
    }

    fn full_key(&self, citation: &Citation, history: &History) -> AuthorityKey {
        let fields = &citation.fields;
        let norm = |value: &Option<String>| value.as_deref().map(normalize_name).unwrap_or_default();

        let key = match citation.citation_type {
            CitationType::Case if fields.has(crate::domain::Field::Parties) => {
                let mut parties: Vec<String> = fields
                    .parties
                    .iter()
                    .map(|p| normalize_name(&self.formatter.rules().party(p)))
                    .collect();
                parties.sort();
                parties.dedup();
                format!("case:{}", parties.join("|"))
            }
            CitationType::Case => match (&fields.volume, &fields.reporter, &fields.page) {
                (Some(volume), Some(reporter), Some(page)) => {
                    let cite = (volume.trim().to_string(), close_up(reporter), page.trim().to_string());
                    if let Some(key) = history.by_cite.get(&cite) {
                        return key.clone();
                    }
                    format!("case-cite:{}|{}|{}", cite.0, cite.1, cite.2)
                }
                _ => format!("other:{}", normalize_name(&citation.raw_text)),
            },
            CitationType::Statute | CitationType::Regulation => {
                if fields.code.as_deref() == Some("Fed. Reg.") {
                    format!("fed-reg:{}|{}", norm(&fields.volume), norm(&fields.page))
                } else {
                    format!(
                        "{}:{}|{}|{}",
                        citation.citation_type.as_str(),
                        norm(&fields.title_number),
                        norm(&fields.code),
                        norm(&fields.section)
                    )
                }
            }
            CitationType::LawReview | CitationType::Book => {
                format!("work:{}|{}", norm(&fields.title), norm(&fields.author))
            }
            CitationType::Website => format!(
                "web:{}",
                fields
                    .url
                    .as_deref()
                    .map(|u| u.trim().trim_end_matches('/').to_lowercase())
                    .unwrap_or_else(|| normalize_name(&citation.raw_text))
            ),
            CitationType::Other => format!("other:{}", normalize_name(&citation.raw_text)),
        };
        AuthorityKey(key)
    }

    /// Index a first citation so later short forms can find it
    fn register(
        &self,
        citation: &Citation,
        key: &AuthorityKey,
        hereinafter: Option<&str>,
        history: &mut History,
    ) {
        if citation.is_short_form() {
            return;
        }
        let fields = &citation.fields;
        let footnote = citation.footnote_number;

        if let Some(name) = hereinafter {
            history.index_name(name, footnote, key);
        }

        match citation.citation_type {
            CitationType::Case => {
                let parties: Vec<String> = fields
                    .parties
                    .iter()
                    .map(|p| normalize_name(p))
                    .collect();
                for party in &fields.parties {
                    history.index_name(party, footnote, key);
                    history.index_name(&self.formatter.rules().party(party), footnote, key);
                }
                if let (Some(volume), Some(reporter)) = (&fields.volume, &fields.reporter) {
                    history
                        .by_reporter
                        .entry((volume.trim().to_string(), close_up(reporter)))
                        .or_default()
                        .push((key.clone(), parties));
                    if let Some(page) = &fields.page {
                        history.by_cite.insert(
                            (volume.trim().to_string(), close_up(reporter), page.trim().to_string()),
                            key.clone(),
                        );
                    }
                }
            }
            CitationType::LawReview | CitationType::Book => {
                if let Some(author) = &fields.author {
                    history.index_name(&author_surname(author), footnote, key);
                    history.index_name(author, footnote, key);
                }
                if let Some(title) = &fields.title {
                    history.index_name(title, footnote, key);
                }
            }
            CitationType::Website => {
                if let Some(title) = &fields.title {
                    history.index_name(title, footnote, key);
                }
            }
            CitationType::Statute | CitationType::Regulation | CitationType::Other => {}
        }
    }

    /// Keep a designation already given in the text, or suggest
    /// `[hereinafter ...]` for works with unwieldy references
    fn hereinafter(&self, citation: &Citation) -> Option<String> {
        if citation.is_short_form() {
            return None;
        }
        if let Some(existing) = citation.fields.hereinafter.as_deref() {
            let existing = existing.trim().trim_matches('*');
            if !existing.is_empty() {
                return Some(format!("*{}*", existing));
            }
        }
        if !matches!(
            citation.citation_type,
            CitationType::LawReview | CitationType::Book | CitationType::Website
        ) || citation.is_short_form()
        {
            return None;
        }
        let title = citation.fields.title.as_deref()?.trim();
        let author = citation.fields.author.as_deref().unwrap_or("");

        let words: Vec<&str> = title.split_whitespace().collect();
        let long_title = title.chars().count() > HEREINAFTER_TITLE_LEN;
        let multiple_authors =
            author.contains(" & ") || author.contains(" and ") || author.contains("et al.");
        let generic = words
            .first()
            .map(|w| GENERIC_TITLE_WORDS.contains(&w.to_lowercase().as_str()))
            .unwrap_or(false)
            && words.len() > 4;

        if !(long_title || multiple_authors || generic) {
            return None;
        }

        let mut short: Vec<&str> = Vec::new();
        let mut significant = 0;
        for word in words.iter().copied().skip_while(|w| {
            matches!(w.to_lowercase().as_str(), "a" | "an" | "the" | "on" | "toward" | "towards")
        }) {
            if significant == 2 {
                break;
            }
            if word.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
                significant += 1;
            } else if short.is_empty() {
                continue;
            }
            short.push(word);
        }
        if short.is_empty() {
            return None;
        }
        Some(format!("*{}*", short.join(" ").trim_end_matches([',', ':', ';'])))
    }
}

/// Citations must be strictly ascending and non-overlapping
pub fn validate_order(citations: &[Citation]) -> Result<(), AnalysisError> {
    for (index, citation) in citations.iter().enumerate() {
        if citation.position_start >= citation.position_end {
            return Err(AnalysisError::Ordering {
                index,
                reason: format!(
                    "empty span {}..{}",
                    citation.position_start, citation.position_end
                ),
            });
        }
        if index > 0 {
            let previous = &citations[index - 1];
            if citation.position_start < previous.position_end {
                return Err(AnalysisError::Ordering {
                    index,
                    reason: format!(
                        "span {}..{} starts before previous span ends at {}",
                        citation.position_start, citation.position_end, previous.position_end
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Lowercase, drop punctuation and markup, collapse whitespace
pub fn normalize_name(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
