//! Bluebook rendering
//!
//! `Formatter::format` is a pure function of a citation, the requested
//! form, and the rule table. Italics are marked with `*...*`.

pub mod rules;

use crate::domain::citation::is_single_party_caption;
use crate::domain::{Citation, CitationType, Pincite};
use crate::normalize::is_supreme_court_reporter;
use rules::{edition_ordinal, group_thousands, pincite_range, FormatRules, NON_DISTINCTIVE_PARTIES};

pub use rules::RuleOverrides;

/// Which form of a citation to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CitationForm {
    /// Complete citation as for a first reference
    Full,
    /// `Id.` / `Id. at 495.` / `Id. § 1715.`
    Id {
        pincite: Option<Pincite>,
        locator: Option<String>,
    },
    /// `Name, supra note 3, at 12.`
    Supra {
        name: String,
        note: Option<u32>,
        pincite: Option<Pincite>,
    },
    /// `*Brown*, 347 U.S. at 490.`
    ShortCase { pincite: Option<Pincite> },
}

/// Renders citations to canonical Bluebook strings
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    rules: FormatRules,
}

impl Formatter {
    pub fn new(rules: FormatRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &FormatRules {
        &self.rules
    }

    pub fn format(&self, citation: &Citation, form: &CitationForm) -> String {
        match form {
            CitationForm::Full => self.full(citation),
            CitationForm::Id { pincite, locator } => {
                let mut out = match locator {
                    Some(locator) => format!("Id. {}", locator),
                    None => "Id.".to_string(),
                };
                if let Some(pin) = pincite {
                    let sep = if locator.is_some() { ", at" } else { " at" };
                    out.push_str(&format!("{} {}", sep, pin_text(pin)));
                }
                terminate(out)
            }
            CitationForm::Supra {
                name,
                note,
                pincite,
            } => {
                let mut out = format!("{}, supra", name);
                if let Some(note) = note {
                    out.push_str(&format!(" note {}", note));
                }
                if let Some(pin) = pincite {
                    out.push_str(&format!(", at {}", pin_text(pin)));
                }
                out.push('.');
                out
            }
            CitationForm::ShortCase { pincite } => self.short_case(citation, pincite.as_ref()),
        }
    }

    /// Full citation in its type's template
    pub fn full(&self, citation: &Citation) -> String {
        let body = match citation.citation_type {
            CitationType::Case => self.case(citation),
            CitationType::Statute => self.statute(citation),
            CitationType::Regulation => self.regulation(citation),
            CitationType::LawReview => self.law_review(citation),
            CitationType::Book => self.book(citation),
            CitationType::Website => self.website(citation),
            CitationType::Other => None,
        };
        match body {
            Some(body) => terminate(body),
            None => citation.raw_text.trim().to_string(),
        }
    }

    /// Name a later supra or short form refers back by
    pub fn short_name(&self, citation: &Citation) -> String {
        let fields = &citation.fields;
        if let Some(name) = fields.short_name.as_deref().filter(|n| !n.trim().is_empty()) {
            let name = name.trim().trim_matches('*');
            return match citation.citation_type {
                CitationType::Case => format!("*{}*", name),
                _ => name.to_string(),
            };
        }

        match citation.citation_type {
            CitationType::Case => {
                let distinctive = fields
                    .parties
                    .iter()
                    .find(|p| !NON_DISTINCTIVE_PARTIES.contains(&p.as_str()))
                    .or_else(|| fields.parties.first());
                match distinctive {
                    Some(party) => format!("*{}*", self.rules.party(party)),
                    None => citation.raw_text.trim().to_string(),
                }
            }
            CitationType::LawReview | CitationType::Book => match fields.author.as_deref() {
                Some(author) => author_surname(author),
                None => fields
                    .title
                    .as_deref()
                    .map(|t| format!("*{}*", t))
                    .unwrap_or_else(|| citation.raw_text.trim().to_string()),
            },
            CitationType::Website => fields
                .title
                .as_deref()
                .map(|t| format!("*{}*", t))
                .or_else(|| fields.url.clone())
                .unwrap_or_else(|| citation.raw_text.trim().to_string()),
            CitationType::Statute | CitationType::Regulation => {
                self.statute_core(citation).unwrap_or_else(|| citation.raw_text.trim().to_string())
            }
            CitationType::Other => citation.raw_text.trim().to_string(),
        }
    }

    fn case(&self, citation: &Citation) -> Option<String> {
        let fields = &citation.fields;
        let mut out = String::new();

        match fields.parties.as_slice() {
            [caption] if is_single_party_caption(caption) => {
                out.push_str(&format!("*{}*", self.rules.party(caption)));
            }
            [first, second, ..] => out.push_str(&format!(
                "*{} v. {}*",
                self.rules.party(first),
                self.rules.party(second)
            )),
            _ => {}
        }

        if let (Some(volume), Some(reporter)) = (&fields.volume, &fields.reporter) {
            if !out.is_empty() {
                out.push_str(", ");
            }
            out.push_str(&format!("{} {}", volume, self.rules.reporter(reporter)));
            if let Some(page) = &fields.page {
                out.push_str(&format!(" {}", page));
            }
            if let Some(pin) = &fields.pincite {
                out.push_str(&format!(", {}", pin_text(pin)));
            }
        }

        if out.is_empty() {
            return None;
        }

        let supreme = fields
            .reporter
            .as_deref()
            .map(is_supreme_court_reporter)
            .unwrap_or(false);
        let court = fields
            .court
            .as_deref()
            .filter(|_| !supreme)
            .and_then(|c| self.rules.court(c));
        let paren = match (court, fields.year) {
            (Some(court), Some(year)) => Some(format!("{} {}", court, year)),
            (Some(court), None) => Some(court),
            (None, Some(year)) => Some(year.to_string()),
            (None, None) => None,
        };
        if let Some(paren) = paren {
            out.push_str(&format!(" ({})", paren));
        }

        Some(out)
    }

    fn short_case(&self, citation: &Citation, pincite: Option<&Pincite>) -> String {
        let fields = &citation.fields;
        let name = self.short_name(citation);
        match (&fields.volume, &fields.reporter) {
            (Some(volume), Some(reporter)) => {
                let at = pincite
                    .map(pin_text)
                    .or_else(|| fields.page.clone())
                    .map(|p| format!(" at {}", p))
                    .unwrap_or_default();
                format!("{}, {} {}{}.", name, volume, self.rules.reporter(reporter), at)
            }
            _ => terminate(name),
        }
    }

    /// `42 U.S.C. § 1983(a)` without the date parenthetical
    fn statute_core(&self, citation: &Citation) -> Option<String> {
        let fields = &citation.fields;
        let mut parts: Vec<String> = Vec::new();

        if let Some(title) = &fields.title_number {
            parts.push(title.clone());
        }
        if let Some(code) = &fields.code {
            parts.push(code.clone());
        }
        if let Some(section) = &fields.section {
            let subsection = fields.subsection.as_deref().unwrap_or("");
            parts.push(format!("§ {}{}", section, subsection));
        }

        (!parts.is_empty()).then(|| parts.join(" "))
    }

    fn statute(&self, citation: &Citation) -> Option<String> {
        let fields = &citation.fields;
        let core = self.statute_core(citation)?;
        let paren: Vec<String> = fields
            .publisher
            .iter()
            .cloned()
            .chain(fields.year.map(|y| y.to_string()))
            .collect();
        Some(if paren.is_empty() {
            core
        } else {
            format!("{} ({})", core, paren.join(" "))
        })
    }

    fn regulation(&self, citation: &Citation) -> Option<String> {
        let fields = &citation.fields;
        if fields.code.as_deref() == Some("Fed. Reg.") {
            let volume = fields.volume.as_deref()?;
            let mut out = format!("{} Fed. Reg.", volume);
            if let Some(page) = &fields.page {
                out.push_str(&format!(" {}", group_thousands(page)));
            }
            if let Some(pin) = &fields.pincite {
                // Group the first page only; the range tail stays as rendered
                let range = pin_text(pin);
                let start = pin.start.to_string();
                out.push_str(&format!(", {}{}", group_thousands(&start), &range[start.len()..]));
            }
            if let Some(year) = fields.year {
                out.push_str(&format!(" ({})", year));
            }
            return Some(out);
        }
        self.statute(citation)
    }

    fn law_review(&self, citation: &Citation) -> Option<String> {
        let fields = &citation.fields;
        let mut head: Vec<String> = Vec::new();
        if let Some(author) = &fields.author {
            head.push(author.clone());
        }
        if let Some(title) = &fields.title {
            head.push(format!("*{}*", title));
        }

        let mut source = String::new();
        if let (Some(volume), Some(journal)) = (&fields.volume, &fields.journal) {
            source.push_str(&format!("{} {}", volume, self.rules.journal(journal)));
            if let Some(page) = &fields.page {
                source.push_str(&format!(" {}", page));
            }
            if let Some(pin) = &fields.pincite {
                source.push_str(&format!(", {}", pin_text(pin)));
            }
        }
        if !source.is_empty() {
            head.push(source);
        }
        if head.is_empty() {
            return None;
        }

        let mut out = head.join(", ");
        if let Some(year) = fields.year {
            out.push_str(&format!(" ({})", year));
        }
        Some(out)
    }

    fn book(&self, citation: &Citation) -> Option<String> {
        let fields = &citation.fields;
        let title = fields.title.as_deref()?;

        let mut out = match &fields.author {
            Some(author) => format!("{}, {}", author, title.to_uppercase()),
            None => title.to_uppercase(),
        };
        if let Some(pin) = &fields.pincite {
            out.push_str(&format!(" {}", pin_text(pin)));
        }

        let mut paren: Vec<String> = Vec::new();
        if let Some(publisher) = &fields.publisher {
            paren.push(publisher.clone());
        }
        if let Some(edition) = &fields.edition {
            paren.push(format!("{} ed.", edition_ordinal(edition)));
        }
        if let Some(year) = fields.year {
            paren.push(year.to_string());
        }
        if !paren.is_empty() {
            out.push_str(&format!(" ({})", paren.join(" ")));
        }
        Some(out)
    }

    fn website(&self, citation: &Citation) -> Option<String> {
        let fields = &citation.fields;
        let mut parts: Vec<String> = Vec::new();
        if let Some(author) = &fields.author {
            parts.push(author.clone());
        }
        if let Some(title) = &fields.title {
            parts.push(format!("*{}*", title));
        }
        parts.push(fields.url.clone()?);

        let mut out = parts.join(", ");
        if let Some(date) = &fields.access_date {
            out.push_str(&format!(" (last visited {})", date));
        }
        Some(out)
    }
}

/// Render a pincite with an en dash range
pub fn pin_text(pin: &Pincite) -> String {
    pincite_range(pin.start, pin.end)
}

/// Last name of the first author (`Cass R. Sunstein & Jane Roe` → `Sunstein`)
pub fn author_surname(author: &str) -> String {
    let first = author
        .split(" & ")
        .next()
        .unwrap_or(author)
        .split(" and ")
        .next()
        .unwrap_or(author)
        .trim_end_matches("et al.")
        .trim()
        .trim_end_matches(',');
    first
        .split_whitespace()
        .last()
        .unwrap_or(first)
        .to_string()
}

fn terminate(mut text: String) -> String {
    if !text.ends_with('.') {
        text.push('.');
    }
    text
}
