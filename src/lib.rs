//! bluebook - Bluebook citation checking for legal documents
//!
//! Finds legal citations in free text, grades how complete each one is,
//! suggests the Bluebook short form (Id., supra) each later reference
//! should take, and flags sentences that read like they need a source.
//!
//! # Pipeline
//!
//! 1. `extract`: pattern library and overlap resolution over the raw text
//! 2. `normalize`: typed fields, status and confidence per citation
//! 3. `core::LookupCoordinator` (optional): fill gaps from external databases
//! 4. `resolver`: one ordered pass assigning full / Id. / supra forms
//! 5. `claims`: unsourced-claim detection outside citation spans
//!
//! # Modules
//!
//! - `adapters`: External legal databases (CourtListener, CrossRef, Open Library, eCFR)
//! - `core`: Analyzer, lookup coordination, limits, errors
//! - `domain`: Data structures (Citation, UnsourcedClaim, AnalysisResult)
//! - `format`: Bluebook rendering and abbreviation tables
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Analyze a brief
//! bluebook analyze --input brief.txt
//!
//! # Same, completing citations online and emitting JSON
//! bluebook analyze --input brief.txt --lookup --json
//!
//! # Format a single citation
//! bluebook format "Brown v. Board of Education, 347 U.S. 483 (1954)"
//! ```

pub mod adapters;
pub mod claims;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod extract;
pub mod format;
pub mod normalize;
pub mod resolver;

// Re-export main types at crate root for convenience
pub use core::{AnalysisError, Analyzer, LookupCoordinator};
pub use domain::{
    AnalysisResult, Citation, CitationStatus, CitationType, ClaimType, ShortFormSuggestion,
    ShortFormType, UnsourcedClaim,
};
pub use format::{CitationForm, Formatter};
