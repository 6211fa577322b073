//! User input validation
//!
//! Rejects strings that carry markup, SQL-injection-like keywords or
//! script-capable URI schemes, and trims everything else.
//!
//! # Rules
//!
//! Applied in order; the first failing rule wins:
//!
//! 1. Empty or absent input is rejected as missing
//! 2. Anything shaped like a tag (`<...>`) is rejected
//! 3. SQL keywords and comment markers, compared case-insensitively
//! 4. `javascript:`, `data:` and `vbscript:`, compared case-sensitively
//!
//! The keyword and scheme checks are plain substring matches. Legitimate
//! text such as "please update me" is rejected too.
//!
//! # Example
//!
//! ```
//! use bulwark_shared::validation::{validate_user_input, ValidationError};
//!
//! let ok = validate_user_input(Some("  Hello world  "));
//! assert!(ok.is_valid());
//! assert_eq!(ok.sanitized(), "Hello world");
//!
//! let bad = validate_user_input(Some("SELECT * FROM users"));
//! assert_eq!(bad.error(), Some(ValidationError::InvalidInput));
//! ```

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

/// Substrings that mark input as SQL-like, matched against the lowercased input
const SQL_PATTERNS: &[&str] = &["select", "insert", "update", "delete", "drop", "union", "--"];

/// URI schemes that can execute or embed content
const DANGEROUS_SCHEMES: &[&str] = &["javascript:", "data:", "vbscript:"];

/// Validation failure kinds
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Input is required")]
    MissingInput,

    #[error("Invalid input")]
    InvalidInput,
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of validating one input string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    sanitized: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ValidationError>,
}

impl ValidationResult {
    fn valid(sanitized: &str) -> Self {
        Self {
            is_valid: true,
            sanitized: sanitized.to_string(),
            error: None,
        }
    }

    fn invalid(error: ValidationError) -> Self {
        Self {
            is_valid: false,
            sanitized: String::new(),
            error: Some(error),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Trimmed input; empty when invalid
    pub fn sanitized(&self) -> &str {
        &self.sanitized
    }

    pub fn error(&self) -> Option<ValidationError> {
        self.error
    }

    /// Converts into the sanitized string or the failure kind
    pub fn into_result(self) -> Result<String, ValidationError> {
        match self.error {
            None => Ok(self.sanitized),
            Some(err) => Err(err),
        }
    }
}

/// Validates and trims a single user-supplied string
pub fn validate_user_input(input: Option<&str>) -> ValidationResult {
    let value = match input {
        Some(v) if !v.is_empty() => v,
        _ => {
            debug!("Input missing");
            return ValidationResult::invalid(ValidationError::MissingInput);
        }
    };

    if contains_tag(value) {
        debug!("Input contains markup");
        return ValidationResult::invalid(ValidationError::InvalidInput);
    }

    let lowered = value.to_lowercase();
    if let Some(pattern) = SQL_PATTERNS.iter().find(|p| lowered.contains(*p)) {
        debug!(pattern, "Input matches SQL pattern");
        return ValidationResult::invalid(ValidationError::InvalidInput);
    }

    if let Some(scheme) = DANGEROUS_SCHEMES.iter().find(|s| value.contains(*s)) {
        debug!(scheme, "Input contains dangerous scheme");
        return ValidationResult::invalid(ValidationError::InvalidInput);
    }

    ValidationResult::valid(value.trim_matches(is_trimmable))
}

/// Whitespace as browsers and JSON clients see it: Unicode `White_Space`
/// plus the byte order mark, minus NEL (U+0085).
fn is_trimmable(c: char) -> bool {
    match c {
        '\u{FEFF}' => true,
        '\u{0085}' => false,
        c => c.is_whitespace(),
    }
}

/// Matches `<[^>]*>`: some `<` is followed, anywhere later, by a `>`.
fn contains_tag(value: &str) -> bool {
    value
        .find('<')
        .map_or(false, |start| value[start..].contains('>'))
}
