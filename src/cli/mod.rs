//! Command-line interface for bluebook.
//!
//! Provides commands for analyzing a document, formatting citations, and
//! showing the resolved configuration.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config;
use crate::core::Analyzer;
use crate::domain::{AnalysisResult, CitationStatus};
use crate::extract::offset_to_line_col;
use crate::extract::spans::extract_anchor_text;
use crate::format::CitationForm;
use crate::normalize::required_fields;

/// bluebook - Bluebook citation checker for legal documents
#[derive(Parser, Debug)]
#[command(name = "bluebook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract citations, suggest short forms, and flag unsourced claims
    Analyze {
        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Complete citations from external legal databases
        #[arg(long)]
        lookup: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the full Bluebook form of each citation in a snippet
    Format {
        /// Citation text (reads from stdin if not provided)
        text: Option<String>,
    },

    /// Show the resolved configuration
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Analyze {
                input,
                lookup,
                json,
            } => analyze(input, lookup, json).await,
            Commands::Format { text } => format_snippet(text),
            Commands::Config => show_config(),
        }
    }
}

/// Read the named file, or stdin when it is piped
fn read_input(input_file: Option<PathBuf>) -> Result<String> {
    if let Some(path) = input_file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()));
    }
    if io::stdin().is_terminal() {
        anyhow::bail!("No input provided. Use --input <file> or pipe to stdin");
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(buffer)
}

async fn analyze(input_file: Option<PathBuf>, lookup: bool, json: bool) -> Result<()> {
    let text = read_input(input_file)?;
    let cfg = config::config()?;

    let mut settings = cfg.config.clone();
    settings.lookup.enabled = lookup && settings.lookup.enabled;
    if lookup && !settings.lookup.enabled {
        eprintln!("[Lookups disabled by configuration; analyzing offline]");
    }

    let analyzer = Analyzer::from_config(&settings)?;
    let result = if analyzer.has_lookups() {
        analyzer.analyze_with_lookup(&text).await?
    } else {
        analyzer.analyze(&text)?
    };

    if json {
        let report = serde_json::to_string_pretty(&result.report())
            .context("Failed to serialize analysis result")?;
        println!("{}", report);
    } else {
        print_report(&text, &result);
    }
    Ok(())
}

/// Characters of surrounding text shown for citations that need work
const CONTEXT_WINDOW: usize = 80;

fn print_report(text: &str, result: &AnalysisResult) {
    print!("{}", render_report(text, result));
}

/// Plain-text report: citations with their suggestions, then claims
pub fn render_report(text: &str, result: &AnalysisResult) -> String {
    let stats = result.stats();
    let mut out = String::new();

    let _ = writeln!(out, "Citations ({}):", stats.total_citations);
    if result.citations.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for citation in &result.citations {
        let at = offset_to_line_col(text, citation.position_start);
        let _ = writeln!(
            out,
            "  {}:{}  {:<11} {:<18} {:.2}  {}",
            at.line,
            at.col,
            citation.citation_type.as_str(),
            citation.status.as_str(),
            citation.confidence_score,
            citation.raw_text
        );

        if citation.status != CitationStatus::Complete {
            let missing: Vec<&str> = required_fields(citation)
                .into_iter()
                .filter(|f| !citation.fields.has(*f))
                .map(|f| f.as_str())
                .collect();
            if !missing.is_empty() {
                let _ = writeln!(out, "        missing: {}", missing.join(", "));
            }
            let _ = writeln!(
                out,
                "        context: {}",
                extract_anchor_text(
                    text,
                    citation.position_start,
                    citation.position_end,
                    CONTEXT_WINDOW
                )
            );
        }
        if let Some(lookup) = &citation.lookup_results {
            let source = lookup.source.as_deref().unwrap_or("-");
            if lookup.found {
                let _ = writeln!(out, "        verified: {}", source);
            } else if let Some(error) = &lookup.error {
                let _ = writeln!(out, "        lookup failed ({}): {}", source, error);
            }
        }
        if let Some(suggestion) = result.suggestion_for(&citation.id) {
            let _ = writeln!(out, "        suggest: {}", suggestion.suggested_form);
            if suggestion.string_cite {
                let _ = writeln!(out, "        string cite: join with the preceding citation using \";\"");
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Unsourced claims ({}):", stats.unsourced_claims);
    if result.unsourced_claims.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for claim in &result.unsourced_claims {
        let at = offset_to_line_col(text, claim.position_start);
        let _ = writeln!(
            out,
            "  {}:{}  {:<11} {:.2}  {}",
            at.line,
            at.col,
            claim.claim_type.as_str(),
            claim.confidence,
            claim.text
        );
        if !claim.suggested_search_terms.is_empty() {
            let _ = writeln!(out, "        search: {}", claim.suggested_search_terms.join("; "));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Summary: {} complete, {} needs verification, {} incomplete, {} malformed",
        stats.complete, stats.needs_verification, stats.incomplete, stats.malformed
    );
    for most in &stats.most_cited {
        let _ = writeln!(out, "  cited {}x: {}", most.count, most.authority);
    }
    out
}

fn format_snippet(text: Option<String>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => read_input(None)?,
    };

    let cfg = config::config()?;
    let analyzer = Analyzer::from_config(&config::Config {
        lookup: crate::core::LookupSettings {
            enabled: false,
            ..cfg.config.lookup.clone()
        },
        ..cfg.config.clone()
    })?;
    let result = analyzer.analyze(&text)?;

    if result.citations.is_empty() {
        eprintln!("No citations found");
        std::process::exit(1);
    }
    for citation in &result.citations {
        println!("{}", analyzer.formatter().format(citation, &CitationForm::Full));
    }
    Ok(())
}

fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    let yaml = serde_yaml::to_string(&cfg.config).context("Failed to serialize configuration")?;
    print!("{}", yaml);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_shows_context_for_incomplete_citation() {
        let text = "Earlier cases disagree. The cite 347 U.S. (1954) is broken, as noted above.";
        let result = Analyzer::new().analyze(text).unwrap();
        let report = render_report(text, &result);

        assert!(report.contains("Citations (1):"));
        assert!(report.contains("missing: parties, page"));
        assert!(report.contains("context: ..."));
        assert!(report.contains("The cite 347 U.S. (1954) is broken, as noted above."));
    }

    #[test]
    fn test_report_marks_string_cites() {
        let text = "Text.[1]\n1. See Brown v. Board, 347 U.S. 483 (1954); Roe v. Wade, 410 U.S. 113 (1973).";
        let result = Analyzer::new().analyze(text).unwrap();
        let report = render_report(text, &result);

        assert_eq!(report.matches("string cite:").count(), 1);
        assert!(!report.contains("context:"));
    }
}
