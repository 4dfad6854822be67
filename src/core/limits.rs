//! Resource limits for document analysis.
//!
//! Bounds the size of a document accepted for analysis and the number of
//! external lookups issued for one document.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Limits applied before and during analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputLimits {
    /// Maximum document size in bytes (default: 10MB)
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,

    /// Maximum lookups issued per document (default: 200)
    #[serde(default = "default_max_lookups")]
    pub max_lookups: usize,

    /// Lookups in flight at once (default: 8)
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
}

fn default_max_input_bytes() -> u64 {
    10 * 1024 * 1024
} // 10MB
fn default_max_lookups() -> usize {
    200
}
fn default_max_concurrent_lookups() -> usize {
    8
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_input_bytes(),
            max_lookups: default_max_lookups(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
        }
    }
}

impl InputLimits {
    /// Validate document text against the size limit
    pub fn validate_input(&self, input: &str) -> Result<(), LimitViolation> {
        let size = input.len() as u64;
        if size > self.max_input_bytes {
            return Err(LimitViolation::MaxInputBytes {
                actual: size,
                limit: self.max_input_bytes,
            });
        }
        Ok(())
    }
}

/// Limit violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitViolation {
    #[error("Maximum input bytes exceeded: {actual} > {limit}")]
    MaxInputBytes { actual: u64, limit: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = InputLimits::default();
        assert_eq!(limits.max_input_bytes, 10 * 1024 * 1024);
        assert_eq!(limits.max_concurrent_lookups, 8);
    }

    #[test]
    fn test_input_validation() {
        let limits = InputLimits {
            max_input_bytes: 100,
            ..Default::default()
        };

        assert!(limits.validate_input("short").is_ok());

        let long_input = "x".repeat(200);
        let result = limits.validate_input(&long_input);
        assert!(matches!(result, Err(LimitViolation::MaxInputBytes { .. })));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let limits: InputLimits = serde_yaml::from_str("max_input_bytes: 1024").unwrap();
        assert_eq!(limits.max_input_bytes, 1024);
        assert_eq!(limits.max_lookups, 200);
    }
}
