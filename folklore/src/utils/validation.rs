//! Validation utilities for names used in manifests and catalogs.
//!
//! Names end up in file paths and result manifests, so they are restricted
//! to a conservative character set and rejected at load time.

use regex::Regex;
use std::sync::OnceLock;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("hard-coded pattern"))
}

/// Validates a work item, stage, or dataset name.
///
/// Names must be non-empty, start with an alphanumeric character, and
/// contain only alphanumerics, `.`, `_`, and `-`.
pub fn validate_name(name: &str) -> Result<(), InvalidNameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(InvalidNameError {
            name: name.to_string(),
            reason: "name cannot be empty or whitespace-only".to_string(),
        });
    }
    if !name_pattern().is_match(trimmed) || trimmed != name {
        return Err(InvalidNameError {
            name: name.to_string(),
            reason: "name may contain only alphanumerics, '.', '_' and '-'".to_string(),
        });
    }
    Ok(())
}

/// Error indicating an invalid name.
#[derive(Debug, Clone)]
pub struct InvalidNameError {
    /// The rejected name.
    pub name: String,
    /// The reason the name is invalid.
    pub reason: String,
}

impl std::fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid name '{}': {}", self.name, self.reason)
    }
}

impl std::error::Error for InvalidNameError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_name("scale_a").is_ok());
        assert!(validate_name("model-2.1").is_ok());
        assert!(validate_name("F1").is_ok());
    }

    #[test]
    fn test_empty_name() {
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn test_rejected_characters() {
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("../escape").is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name(" padded ").is_err());
    }

    #[test]
    fn test_error_display() {
        let err = validate_name("a b").unwrap_err();
        assert!(err.to_string().contains("a b"));
    }
}
