//! Abbreviation rule tables for the formatter.
//!
//! Defaults cover the common federal reporters, circuit and district
//! courts, major journals and the frequent party-name words. Extra entries
//! can be merged in from configuration; a configured entry replaces the
//! default with the same key.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const REPORTERS: &[(&str, &str)] = &[
    ("United States Reports", "U.S."),
    ("Supreme Court Reporter", "S. Ct."),
    ("Lawyers Edition", "L. Ed."),
    ("Lawyers Edition Second", "L. Ed. 2d"),
    ("Federal Reporter", "F."),
    ("Federal Reporter Second Series", "F.2d"),
    ("Federal Reporter Third Series", "F.3d"),
    ("Federal Reporter Fourth Series", "F.4th"),
    ("Federal Supplement", "F. Supp."),
    ("Federal Supplement Second Series", "F. Supp. 2d"),
    ("Federal Supplement Third Series", "F. Supp. 3d"),
    ("Federal Rules Decisions", "F.R.D."),
    ("Bankruptcy Reporter", "B.R."),
    ("Federal Claims Reporter", "Fed. Cl."),
    ("Atlantic Reporter", "A."),
    ("Atlantic Reporter Second Series", "A.2d"),
    ("Atlantic Reporter Third Series", "A.3d"),
    ("North Eastern Reporter", "N.E."),
    ("North Eastern Reporter Second Series", "N.E.2d"),
    ("North Eastern Reporter Third Series", "N.E.3d"),
    ("North Western Reporter", "N.W."),
    ("North Western Reporter Second Series", "N.W.2d"),
    ("Pacific Reporter", "P."),
    ("Pacific Reporter Second Series", "P.2d"),
    ("Pacific Reporter Third Series", "P.3d"),
    ("South Eastern Reporter", "S.E."),
    ("South Eastern Reporter Second Series", "S.E.2d"),
    ("South Western Reporter", "S.W."),
    ("South Western Reporter Second Series", "S.W.2d"),
    ("South Western Reporter Third Series", "S.W.3d"),
    ("Southern Reporter", "So."),
    ("Southern Reporter Second Series", "So. 2d"),
    ("Southern Reporter Third Series", "So. 3d"),
    ("California Reporter", "Cal. Rptr."),
    ("California Reporter Second Series", "Cal. Rptr. 2d"),
    ("California Reporter Third Series", "Cal. Rptr. 3d"),
    ("New York Supplement", "N.Y.S."),
    ("New York Supplement Second Series", "N.Y.S.2d"),
    ("New York Supplement Third Series", "N.Y.S.3d"),
];

/// An empty abbreviation means the court is implied by the reporter
const COURTS: &[(&str, &str)] = &[
    ("Supreme Court of the United States", ""),
    ("Supreme Court", ""),
    ("First Circuit", "1st Cir."),
    ("Second Circuit", "2d Cir."),
    ("Third Circuit", "3d Cir."),
    ("Fourth Circuit", "4th Cir."),
    ("Fifth Circuit", "5th Cir."),
    ("Sixth Circuit", "6th Cir."),
    ("Seventh Circuit", "7th Cir."),
    ("Eighth Circuit", "8th Cir."),
    ("Ninth Circuit", "9th Cir."),
    ("Tenth Circuit", "10th Cir."),
    ("Eleventh Circuit", "11th Cir."),
    ("D.C. Circuit", "D.C. Cir."),
    ("Federal Circuit", "Fed. Cir."),
    ("District of Columbia", "D.D.C."),
    ("Eastern District of New York", "E.D.N.Y."),
    ("Southern District of New York", "S.D.N.Y."),
    ("Northern District of California", "N.D. Cal."),
    ("Central District of California", "C.D. Cal."),
    ("Eastern District of Virginia", "E.D. Va."),
    ("District of Massachusetts", "D. Mass."),
    ("Northern District of Illinois", "N.D. Ill."),
    ("Eastern District of Pennsylvania", "E.D. Pa."),
    ("District of Delaware", "D. Del."),
];

const JOURNALS: &[(&str, &str)] = &[
    ("Harvard Law Review", "Harv. L. Rev."),
    ("Yale Law Journal", "Yale L.J."),
    ("Stanford Law Review", "Stan. L. Rev."),
    ("Columbia Law Review", "Colum. L. Rev."),
    ("Michigan Law Review", "Mich. L. Rev."),
    ("Virginia Law Review", "Va. L. Rev."),
    ("California Law Review", "Calif. L. Rev."),
    ("Georgetown Law Journal", "Geo. L.J."),
    ("Texas Law Review", "Tex. L. Rev."),
    ("University of Pennsylvania Law Review", "U. Pa. L. Rev."),
    ("Duke Law Journal", "Duke L.J."),
    ("Northwestern University Law Review", "Nw. U. L. Rev."),
    ("University of Chicago Law Review", "U. Chi. L. Rev."),
    ("New York University Law Review", "N.Y.U. L. Rev."),
    ("Cornell Law Review", "Cornell L. Rev."),
    ("Minnesota Law Review", "Minn. L. Rev."),
    ("Vanderbilt Law Review", "Vand. L. Rev."),
    ("Boston University Law Review", "B.U. L. Rev."),
    ("George Washington Law Review", "Geo. Wash. L. Rev."),
    ("Notre Dame Law Review", "Notre Dame L. Rev."),
    ("UCLA Law Review", "UCLA L. Rev."),
    ("Southern California Law Review", "S. Cal. L. Rev."),
    ("American Journal of International Law", "Am. J. Int'l L."),
    ("Journal of Law and Economics", "J.L. & Econ."),
    ("Law and Contemporary Problems", "Law & Contemp. Probs."),
];

const PARTY_WORDS: &[(&str, &str)] = &[
    ("Administration", "Admin."),
    ("Administrative", "Admin."),
    ("America", "Am."),
    ("American", "Am."),
    ("and", "&"),
    ("Association", "Ass'n"),
    ("Authority", "Auth."),
    ("Automobile", "Auto."),
    ("Board", "Bd."),
    ("Brothers", "Bros."),
    ("Building", "Bldg."),
    ("Center", "Ctr."),
    ("Chemical", "Chem."),
    ("Commission", "Comm'n"),
    ("Commissioner", "Comm'r"),
    ("Committee", "Comm."),
    ("Communications", "Commc'ns"),
    ("Community", "Cmty."),
    ("Company", "Co."),
    ("Construction", "Constr."),
    ("Corporation", "Corp."),
    ("County", "Cnty."),
    ("Department", "Dep't"),
    ("Development", "Dev."),
    ("Distributors", "Distribs."),
    ("District", "Dist."),
    ("Division", "Div."),
    ("Education", "Educ."),
    ("Electric", "Elec."),
    ("Engineering", "Eng'g"),
    ("Enterprises", "Enters."),
    ("Entertainment", "Ent."),
    ("Environmental", "Envtl."),
    ("Equipment", "Equip."),
    ("Exchange", "Exch."),
    ("Federal", "Fed."),
    ("Federation", "Fed'n"),
    ("Financial", "Fin."),
    ("Foundation", "Found."),
    ("General", "Gen."),
    ("Government", "Gov't"),
    ("Hospital", "Hosp."),
    ("Housing", "Hous."),
    ("Incorporated", "Inc."),
    ("Independent", "Indep."),
    ("Industries", "Indus."),
    ("Information", "Info."),
    ("Institute", "Inst."),
    ("Insurance", "Ins."),
    ("International", "Int'l"),
    ("Investment", "Inv."),
    ("Laboratories", "Labs."),
    ("Liability", "Liab."),
    ("Limited", "Ltd."),
    ("Litigation", "Litig."),
    ("Management", "Mgmt."),
    ("Manufacturing", "Mfg."),
    ("Marketing", "Mktg."),
    ("Medical", "Med."),
    ("Municipal", "Mun."),
    ("Mutual", "Mut."),
    ("National", "Nat'l"),
    ("Organization", "Org."),
    ("Partnership", "P'ship"),
    ("Pharmaceutical", "Pharm."),
    ("Products", "Prods."),
    ("Professional", "Prof'l"),
    ("Property", "Prop."),
    ("Public", "Pub."),
    ("Railroad", "R.R."),
    ("Railway", "Ry."),
    ("Regional", "Reg'l"),
    ("Research", "Rsch."),
    ("Resources", "Res."),
    ("Savings", "Sav."),
    ("School", "Sch."),
    ("Secretary", "Sec'y"),
    ("Security", "Sec."),
    ("Services", "Servs."),
    ("Society", "Soc'y"),
    ("System", "Sys."),
    ("Systems", "Sys."),
    ("Technology", "Tech."),
    ("Telephone", "Tel."),
    ("Transportation", "Transp."),
    ("University", "Univ."),
    ("Utilities", "Utils."),
];

/// Party names that are too common to serve as a short case name
pub const NON_DISTINCTIVE_PARTIES: &[&str] = &[
    "United States",
    "State",
    "People",
    "Commonwealth",
    "City",
    "County",
];

/// Extra abbreviations supplied by configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleOverrides {
    #[serde(default)]
    pub reporters: BTreeMap<String, String>,
    #[serde(default)]
    pub courts: BTreeMap<String, String>,
    #[serde(default)]
    pub journals: BTreeMap<String, String>,
    #[serde(default)]
    pub party_words: BTreeMap<String, String>,
}

/// Lookup tables from full names to Bluebook abbreviations
#[derive(Debug, Clone, PartialEq)]
pub struct FormatRules {
    reporters: BTreeMap<String, String>,
    courts: BTreeMap<String, String>,
    journals: BTreeMap<String, String>,
    party_words: BTreeMap<String, String>,
}

fn table(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(full, abbr)| (full.to_string(), abbr.to_string()))
        .collect()
}

impl Default for FormatRules {
    fn default() -> Self {
        Self {
            reporters: table(REPORTERS),
            courts: table(COURTS),
            journals: table(JOURNALS),
            party_words: table(PARTY_WORDS),
        }
    }
}

impl FormatRules {
    /// Defaults with configured entries merged on top
    pub fn with_overrides(overrides: &RuleOverrides) -> Self {
        let mut rules = Self::default();
        rules.merge(overrides);
        rules
    }

    pub fn merge(&mut self, overrides: &RuleOverrides) {
        self.reporters.extend(overrides.reporters.clone());
        self.courts.extend(overrides.courts.clone());
        self.journals.extend(overrides.journals.clone());
        self.party_words.extend(overrides.party_words.clone());
    }

    /// Reporter abbreviation with Bluebook spacing applied
    pub fn reporter(&self, reporter: &str) -> String {
        let reporter = reporter.trim();
        match self.reporters.get(reporter) {
            Some(abbr) => abbr.clone(),
            None => close_up(reporter),
        }
    }

    /// Court abbreviation; `None` when the court is implied
    pub fn court(&self, court: &str) -> Option<String> {
        let court = court.trim();
        let abbr = self
            .courts
            .get(court)
            .cloned()
            .unwrap_or_else(|| court.to_string());
        (!abbr.is_empty()).then_some(abbr)
    }

    pub fn journal(&self, journal: &str) -> String {
        let journal = journal.trim();
        self.journals
            .get(journal)
            .cloned()
            .unwrap_or_else(|| journal.to_string())
    }

    /// Abbreviate a party name word by word, dropping a leading "The"
    pub fn party(&self, party: &str) -> String {
        let party = party.trim();
        let party = party
            .strip_prefix("The ")
            .or_else(|| party.strip_prefix("the "))
            .unwrap_or(party);

        party
            .split_whitespace()
            .map(|word| {
                let (core, trailing) = split_trailing_punct(word);
                match self.party_words.get(core) {
                    Some(abbr) => format!("{}{}", abbr, trailing),
                    None => word.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn split_trailing_punct(word: &str) -> (&str, &str) {
    let end = word.trim_end_matches([',', ';', ':']).len();
    (&word[..end], &word[end..])
}

/// Close up adjacent single capitals and ordinals (`F. 3d` → `F.3d`,
/// `U. S.` → `U.S.`) while longer abbreviations keep their spaces
/// (`F. Supp. 2d`).
pub fn close_up(abbreviation: &str) -> String {
    let mut atoms: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in abbreviation.chars() {
        if c.is_whitespace() {
            if !current.is_empty() {
                atoms.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(c);
        if c == '.' {
            atoms.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        atoms.push(current);
    }

    let single = |atom: &str| {
        let mut chars = atom.chars();
        let first = chars.next().unwrap_or(' ');
        (first.is_ascii_uppercase() && chars.as_str() == ".") || first.is_ascii_digit()
    };

    let mut out = String::new();
    for (i, atom) in atoms.iter().enumerate() {
        if i > 0 && !(single(&atoms[i - 1]) && single(atom)) {
            out.push(' ');
        }
        out.push_str(atom);
    }
    out
}

/// Bluebook month abbreviation (T12)
pub fn month_abbreviation(month: u32) -> &'static str {
    match month {
        1 => "Jan.",
        2 => "Feb.",
        3 => "Mar.",
        4 => "Apr.",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "Aug.",
        9 => "Sept.",
        10 => "Oct.",
        11 => "Nov.",
        _ => "Dec.",
    }
}

/// Date in Bluebook form: `Mar. 5, 2020`
pub fn bluebook_date(date: NaiveDate) -> String {
    format!(
        "{} {}, {}",
        month_abbreviation(date.month()),
        date.day(),
        date.year()
    )
}

/// Bluebook ordinal for editions: `2nd` → `2d`, `3rd` → `3d`
pub fn edition_ordinal(edition: &str) -> String {
    let edition = edition.trim().trim_end_matches("ed.").trim();
    edition.replace("nd", "d").replace("rd", "d")
}

/// Pincite range with an en dash, retaining the last two digits of the
/// end page when the leading digits repeat (`495–97`).
pub fn pincite_range(start: u32, end: Option<u32>) -> String {
    match end {
        None => start.to_string(),
        Some(end) => {
            let s = start.to_string();
            let e = end.to_string();
            if s.len() == e.len() && s.len() > 2 && s[..s.len() - 2] == e[..e.len() - 2] {
                format!("{}–{}", s, &e[e.len() - 2..])
            } else {
                format!("{}–{}", s, e)
            }
        }
    }
}

/// Insert thousands separators: `12345` → `12,345`
pub fn group_thousands(number: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 5 {
        return digits;
    }
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_up() {
        assert_eq!(close_up("F. 3d"), "F.3d");
        assert_eq!(close_up("U. S."), "U.S.");
        assert_eq!(close_up("F. Supp. 2d"), "F. Supp. 2d");
        assert_eq!(close_up("S.Ct."), "S. Ct.");
        assert_eq!(close_up("N.Y.S.2d"), "N.Y.S.2d");
    }

    #[test]
    fn test_reporter_table() {
        let rules = FormatRules::default();
        assert_eq!(rules.reporter("Federal Reporter Third Series"), "F.3d");
        assert_eq!(rules.reporter("U.S."), "U.S.");
    }

    #[test]
    fn test_court_implied_by_supreme_court() {
        let rules = FormatRules::default();
        assert_eq!(rules.court("Supreme Court"), None);
        assert_eq!(rules.court("Ninth Circuit"), Some("9th Cir.".to_string()));
        assert_eq!(rules.court("1st Cir."), Some("1st Cir.".to_string()));
    }

    #[test]
    fn test_party_abbreviation() {
        let rules = FormatRules::default();
        assert_eq!(rules.party("Board of Education"), "Bd. of Educ.");
        assert_eq!(rules.party("The National Labor Relations Board"), "Nat'l Labor Relations Bd.");
    }

    #[test]
    fn test_overrides_merge() {
        let mut overrides = RuleOverrides::default();
        overrides
            .reporters
            .insert("West Law".to_string(), "WL".to_string());
        overrides
            .party_words
            .insert("Board".to_string(), "Board".to_string());
        let rules = FormatRules::with_overrides(&overrides);
        assert_eq!(rules.reporter("West Law"), "WL");
        assert_eq!(rules.party("Board"), "Board");
    }

    #[test]
    fn test_pincite_range() {
        assert_eq!(pincite_range(495, None), "495");
        assert_eq!(pincite_range(495, Some(497)), "495–97");
        assert_eq!(pincite_range(99, Some(101)), "99–101");
        assert_eq!(pincite_range(1005, Some(1010)), "1005–10");
        assert_eq!(pincite_range(12, Some(15)), "12–15");
    }

    #[test]
    fn test_dates_and_editions() {
        let date = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        assert_eq!(bluebook_date(date), "June 1, 2020");
        assert_eq!(edition_ordinal("2nd"), "2d");
        assert_eq!(edition_ordinal("3rd"), "3d");
        assert_eq!(edition_ordinal("9th"), "9th");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("12345"), "12,345");
        assert_eq!(group_thousands("1234"), "1234");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }
}
