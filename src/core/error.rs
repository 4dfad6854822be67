//! Whole-document failures.
//!
//! Everything that can go wrong with a single citation or claim is carried
//! as data on that record. Only failures that leave no usable result for
//! the document surface here.

use thiserror::Error;

use super::limits::LimitViolation;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("Document too large: {actual} bytes > {limit} bytes")]
    InputTooLarge { actual: u64, limit: u64 },

    #[error("Citation order violated at index {index}: {reason}")]
    Ordering { index: usize, reason: String },

    #[error("Unknown citation: {0}")]
    UnknownCitation(String),
}

impl From<LimitViolation> for AnalysisError {
    fn from(violation: LimitViolation) -> Self {
        match violation {
            LimitViolation::MaxInputBytes { actual, limit } => {
                AnalysisError::InputTooLarge { actual, limit }
            }
        }
    }
}
