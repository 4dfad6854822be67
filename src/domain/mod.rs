//! Domain types for citation analysis.
//!
//! This module contains the core data structures:
//! - Citation: a detected citation span with typed fields
//! - UnsourcedClaim: prose that likely needs a citation
//! - Analysis: short-form suggestions, results and statistics

pub mod analysis;
pub mod citation;
pub mod claim;

// Re-export commonly used types
pub use analysis::{
    AnalysisReport, AnalysisResult, AnalysisStats, CitationStyle, DocumentStructure, MostCited,
    ShortFormSuggestion, ShortFormType,
};
pub use citation::{
    Citation, CitationFields, CitationStatus, CitationType, Field, LookupRecord, LookupResult,
    Pincite, ShortFormKind,
};
pub use claim::{ClaimType, UnsourcedClaim};
