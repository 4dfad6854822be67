//! Unsourced claims: prose that reads like it needs a citation but has none.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::extract::spans::compute_claim_id;

/// Heuristic category of an unsourced claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Legal,
    Statistical,
    Factual,
    Quotation,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Legal => "legal",
            ClaimType::Statistical => "statistical",
            ClaimType::Factual => "factual",
            ClaimType::Quotation => "quotation",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flagged sentence. Immutable once created by the claim detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsourcedClaim {
    pub id: String,
    /// The flagged sentence, trimmed
    pub text: String,
    pub position_start: usize,
    pub position_end: usize,
    pub claim_type: ClaimType,
    /// Heuristic confidence in [0, 1]
    pub confidence: f64,
    /// Most salient first
    #[serde(default)]
    pub suggested_search_terms: Vec<String>,
}

impl UnsourcedClaim {
    pub fn new(
        text: impl Into<String>,
        position_start: usize,
        position_end: usize,
        claim_type: ClaimType,
        confidence: f64,
        suggested_search_terms: Vec<String>,
    ) -> Self {
        let text = text.into();
        Self {
            id: compute_claim_id(position_start, position_end, &text),
            text,
            position_start,
            position_end,
            claim_type,
            confidence,
            suggested_search_terms,
        }
    }
}
