//! Search terms for unsourced claims, most salient first

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::ClaimType;

static CASE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][A-Za-z'\-]+)\s+v\.\s+([A-Z][A-Za-z'\-]+)").unwrap());

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["\u{201C}]([^"\u{201C}\u{201D}]{15,})["\u{201D}]"#).unwrap());

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z'\-]*").unwrap());

const LEGAL_CONCEPTS: &[&str] = &[
    "due process",
    "equal protection",
    "free speech",
    "establishment clause",
    "free exercise",
    "commerce clause",
    "supremacy clause",
    "strict scrutiny",
    "intermediate scrutiny",
    "rational basis",
    "standing",
    "mootness",
    "ripeness",
    "sovereign immunity",
    "qualified immunity",
    "probable cause",
    "reasonable suspicion",
    "exigent circumstances",
    "summary judgment",
    "class action",
    "negligence",
    "proximate cause",
    "preemption",
    "fair use",
];

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "it", "its", "that", "this", "these", "those",
    "as", "of", "to", "in", "for", "on", "with", "by", "from", "at", "and", "or", "but", "not",
    "be", "been", "being", "have", "has", "had", "do", "does", "did", "will", "would", "could",
    "should", "may", "might", "must", "shall", "can", "need", "there", "here", "than", "then",
    "they", "their", "them", "which", "when", "where", "while", "also", "such", "some", "many",
    "most", "more", "very", "into", "over", "under", "about", "only", "other",
];

/// Up to `max` terms: quoted text, case names, legal concepts, proper
/// noun phrases, then content words
pub fn search_terms(sentence: &str, claim_type: ClaimType, max: usize) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();

    if claim_type == ClaimType::Quotation {
        if let Some(caps) = QUOTED.captures(sentence) {
            let words: Vec<&str> = caps[1].split_whitespace().take(6).collect();
            push_term(words.join(" "), &mut terms);
        }
    }

    for caps in CASE_NAME.captures_iter(sentence) {
        push_term(format!("{} v. {}", &caps[1], &caps[2]), &mut terms);
    }

    let lower = sentence.to_lowercase();
    for concept in LEGAL_CONCEPTS {
        if lower.contains(concept) {
            push_term(concept.to_string(), &mut terms);
        }
    }

    for phrase in proper_noun_phrases(sentence) {
        push_term(phrase, &mut terms);
    }

    for word in content_words(sentence) {
        push_term(word, &mut terms);
    }

    terms.truncate(max);
    terms
}

fn push_term(term: String, terms: &mut Vec<String>) {
    let term = term.trim().to_string();
    if term.is_empty() || terms.iter().any(|t| t.eq_ignore_ascii_case(&term)) {
        return;
    }
    terms.push(term);
}

fn flush_run(run: &mut Vec<&str>, starts_sentence: bool, phrases: &mut Vec<String>) {
    let keep = run.len() > 1 || !starts_sentence;
    let significant: Vec<&str> = run
        .iter()
        .copied()
        .skip_while(|w| STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    if keep && !significant.is_empty() {
        phrases.push(significant.join(" "));
    }
    run.clear();
}

/// Runs of capitalized words; a lone capitalized first word is just the
/// start of the sentence
fn proper_noun_phrases(sentence: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    let mut run_starts_sentence = false;
    let mut last_end = 0;

    for (index, m) in WORD.find_iter(sentence).enumerate() {
        let word = m.as_str();
        let gap = &sentence[last_end..m.start()];
        last_end = m.end();
        let capitalized = word.chars().next().map(char::is_uppercase).unwrap_or(false);

        if !run.is_empty() && (!capitalized || !gap.trim().is_empty()) {
            flush_run(&mut run, run_starts_sentence, &mut phrases);
        }
        if capitalized {
            if run.is_empty() {
                run_starts_sentence = index == 0;
            }
            run.push(word);
        }
    }
    if !run.is_empty() {
        flush_run(&mut run, run_starts_sentence, &mut phrases);
    }
    phrases
}

fn content_words(sentence: &str) -> Vec<String> {
    WORD.find_iter(sentence)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.len() >= 4 && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistical_sentence_terms() {
        let terms = search_terms(
            "Courts have consistently held that 73% of similar claims fail.",
            ClaimType::Statistical,
            5,
        );
        assert_eq!(terms, vec!["courts", "consistently", "held", "similar", "claims"]);
    }

    #[test]
    fn test_concepts_and_proper_nouns_first() {
        let terms = search_terms(
            "The Fourth Amendment requires probable cause before a search.",
            ClaimType::Legal,
            3,
        );
        assert_eq!(terms, vec!["probable cause", "Fourth Amendment", "fourth"]);
    }

    #[test]
    fn test_quotation_terms() {
        let terms = search_terms(
            "The Court ordered desegregation \"with all deliberate speed\" in 1955.",
            ClaimType::Quotation,
            2,
        );
        assert_eq!(terms[0], "with all deliberate speed");
    }

    #[test]
    fn test_case_names_extracted() {
        let terms = search_terms("Plessy v. Ferguson was overruled.", ClaimType::Legal, 5);
        assert_eq!(terms[0], "Plessy v. Ferguson");
    }

    #[test]
    fn test_cap_respected() {
        let terms = search_terms(
            "Alpha beta gamma delta epsilon zeta theta iota kappa lambda.",
            ClaimType::Factual,
            2,
        );
        assert_eq!(terms.len(), 2);
    }
}
