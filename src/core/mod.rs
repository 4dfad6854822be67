//! Core orchestration logic.
//!
//! This module contains:
//! - Analyzer: the document pipeline
//! - LookupCoordinator: routing, timeouts and fill-only merging of lookups
//! - Limits: input size and lookup budgets
//! - AnalysisError: whole-document failures

pub mod analyzer;
pub mod error;
pub mod limits;
pub mod lookup;

// Re-export commonly used types
pub use analyzer::Analyzer;
pub use error::AnalysisError;
pub use limits::{InputLimits, LimitViolation};
pub use lookup::{fill_missing, LookupCoordinator, LookupSettings};
