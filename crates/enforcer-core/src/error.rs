//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout the enforcer. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Every validation failure carries a stable [`ErrorCode`], a
//!   human-readable message, and a slash-delimited path from the root of
//!   the validated value.
//! - Several failures aggregate into a single `MLTI` error whose `causes`
//!   hold the individual failures; a single failure is never wrapped.
//! - Format codec failures distinguish syntax (`FRMT`) from calendar
//!   (`DATE`) problems, and lenient conversion failures report `TYPE`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable short codes for every failure the enforcer reports.
///
/// The string form (see [`ErrorCode::as_str`]) is part of the public
/// contract and is what callers and tests match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Value kind does not match the schema kind.
    #[serde(rename = "TYPE")]
    Type,
    /// String does not match the syntax of its declared format.
    #[serde(rename = "FRMT")]
    Format,
    /// Date or date-time is well-formed but not a real instant.
    #[serde(rename = "DATE")]
    Date,
    /// Number above `maximum`.
    #[serde(rename = "NMAX")]
    NumberMax,
    /// Number below `minimum`.
    #[serde(rename = "NMIN")]
    NumberMin,
    /// Number is not a multiple of `multipleOf`.
    #[serde(rename = "NMULT")]
    NumberMultiple,
    /// String longer than `maxLength`.
    #[serde(rename = "SMAX")]
    StringMax,
    /// String shorter than `minLength`.
    #[serde(rename = "SMIN")]
    StringMin,
    /// String does not match `pattern`.
    #[serde(rename = "SPAT")]
    StringPattern,
    /// Array item count or object property count out of bounds.
    #[serde(rename = "LEN")]
    Length,
    /// Array contains a duplicate under `uniqueItems`.
    #[serde(rename = "UNIQ")]
    Unique,
    /// Required property is missing.
    #[serde(rename = "REQ")]
    Required,
    /// Property is not permitted by the schema.
    #[serde(rename = "NPER")]
    NotPermitted,
    /// Value is not one of the `enum` options.
    #[serde(rename = "ENUM")]
    Enum,
    /// Discriminator could not resolve a schema hierarchy.
    #[serde(rename = "HTNC")]
    Hierarchy,
    /// Live enforcement is not available for the value.
    #[serde(rename = "PROX")]
    Proxy,
    /// Aggregate of several errors.
    #[serde(rename = "MLTI")]
    Multiple,
}

impl ErrorCode {
    /// Returns the stable short code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Type => "TYPE",
            ErrorCode::Format => "FRMT",
            ErrorCode::Date => "DATE",
            ErrorCode::NumberMax => "NMAX",
            ErrorCode::NumberMin => "NMIN",
            ErrorCode::NumberMultiple => "NMULT",
            ErrorCode::StringMax => "SMAX",
            ErrorCode::StringMin => "SMIN",
            ErrorCode::StringPattern => "SPAT",
            ErrorCode::Length => "LEN",
            ErrorCode::Unique => "UNIQ",
            ErrorCode::Required => "REQ",
            ErrorCode::NotPermitted => "NPER",
            ErrorCode::Enum => "ENUM",
            ErrorCode::Hierarchy => "HTNC",
            ErrorCode::Proxy => "PROX",
            ErrorCode::Multiple => "MLTI",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation failure, or an `MLTI` aggregate of several.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("[{code}] {message}{}", at_suffix(.path))]
pub struct ValidationError {
    /// Stable failure code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Slash-delimited pointer from the validation root; empty for the root.
    pub path: String,
    /// Individual failures when `code` is [`ErrorCode::Multiple`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<ValidationError>,
}

fn at_suffix(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" [at {path}]")
    }
}

impl ValidationError {
    /// Create a single (non-aggregate) validation error.
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: path.into(),
            causes: Vec::new(),
        }
    }

    /// Collapse a list of errors into the error callers observe.
    ///
    /// Returns `None` for an empty list, the error itself for a single
    /// entry, and an `MLTI` aggregate otherwise.
    pub fn aggregate(mut errors: Vec<ValidationError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            count => {
                let listing = errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("\n\t");
                Some(Self {
                    code: ErrorCode::Multiple,
                    message: format!(
                        "Validation failed due to {count} errors:\n\t{listing}"
                    ),
                    path: String::new(),
                    causes: errors,
                })
            }
        }
    }

    /// The leaf errors: `causes` for an aggregate, otherwise the error itself.
    pub fn leaves(&self) -> Vec<&ValidationError> {
        if self.causes.is_empty() {
            vec![self]
        } else {
            self.causes.iter().flat_map(|c| c.leaves()).collect()
        }
    }

    /// Re-root this error (and its causes) beneath `prefix`.
    pub fn prefixed(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() {
            self.path = format!("{prefix}{}", self.path);
            self.causes = self.causes.into_iter().map(|c| c.prefixed(prefix)).collect();
        }
        self
    }
}

/// Failure of a format codec.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct FormatError {
    /// `FRMT` for syntax, `DATE` for calendar, `TYPE` for failed conversion.
    pub code: ErrorCode,
    /// What the codec expected, e.g. `"a base64 encoded string"`.
    pub expected: &'static str,
    /// Human-readable description including the received value.
    pub message: String,
}

impl FormatError {
    /// The text does not follow the wire grammar of the format.
    pub fn syntax(expected: &'static str, received: impl fmt::Display) -> Self {
        Self {
            code: ErrorCode::Format,
            expected,
            message: format!("Expected {expected}. Received: {received}"),
        }
    }

    /// The text is well-formed but names an instant that does not exist.
    pub fn calendar(expected: &'static str, reason: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Date,
            expected,
            message: reason.into(),
        }
    }

    /// Lenient conversion could not interpret the input.
    pub fn conversion(expected: &'static str, received: impl fmt::Display) -> Self {
        Self {
            code: ErrorCode::Type,
            expected,
            message: format!("Cannot convert to {expected}. Received: {received}"),
        }
    }

    /// Report this failure as a validation error at `path`.
    pub fn at(&self, path: impl Into<String>) -> ValidationError {
        ValidationError::new(self.code, path, self.message.clone())
    }
}

/// The raw schema could not be prepared.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A schema (or sub-schema) is not a JSON object.
    #[error("invalid schema at {path}: must be a non-null object")]
    NotAnObject {
        /// Location of the offending sub-schema within the raw schema.
        path: String,
    },

    /// A keyword has a value of the wrong shape.
    #[error("invalid schema at {path}: keyword {keyword} {reason}")]
    InvalidKeyword {
        /// Location of the schema holding the keyword.
        path: String,
        /// The offending keyword.
        keyword: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The `pattern` keyword is not a valid regular expression.
    #[error("invalid pattern at {path}: {reason}")]
    InvalidPattern {
        /// Location of the schema holding the pattern.
        path: String,
        /// Regex compiler message.
        reason: String,
    },
}

/// Top-level error type for the enforcer.
#[derive(Error, Debug, Clone)]
pub enum EnforcerError {
    /// The schema could not be prepared.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A value failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A format codec rejected its input.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Live enforcement cannot wrap the requested value.
    #[error("live enforcement unsupported: {0}")]
    Unsupported(String),

    /// A handle refers to a position that was removed from its root.
    #[error("handle position {path:?} no longer exists")]
    Detached {
        /// The stale position.
        path: String,
    },

    /// An array index past the end of the array (holes are not permitted).
    #[error("index {index} is out of bounds for array of length {length} [at {path}]")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Current array length.
        length: usize,
        /// Position of the array.
        path: String,
    },
}

impl EnforcerError {
    /// The stable code of this error, when it has one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            EnforcerError::Schema(_) => None,
            EnforcerError::Validation(e) => Some(e.code),
            EnforcerError::Format(e) => Some(e.code),
            EnforcerError::Unsupported(_) | EnforcerError::Detached { .. } => {
                Some(ErrorCode::Proxy)
            }
            EnforcerError::IndexOutOfBounds { .. } => Some(ErrorCode::Length),
        }
    }

    /// The validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            EnforcerError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_strings_are_stable() {
        assert_eq!(ErrorCode::NumberMultiple.as_str(), "NMULT");
        assert_eq!(ErrorCode::Hierarchy.to_string(), "HTNC");
        assert_eq!(
            serde_json::to_string(&ErrorCode::NotPermitted).unwrap(),
            "\"NPER\""
        );
    }

    #[test]
    fn test_aggregate_empty_is_none() {
        assert!(ValidationError::aggregate(Vec::new()).is_none());
    }

    #[test]
    fn test_aggregate_single_keeps_code() {
        let err = ValidationError::new(ErrorCode::Required, "/name", "missing");
        let agg = ValidationError::aggregate(vec![err.clone()]).unwrap();
        assert_eq!(agg, err);
    }

    #[test]
    fn test_aggregate_many_is_multiple() {
        let agg = ValidationError::aggregate(vec![
            ValidationError::new(ErrorCode::NumberMin, "", "too small"),
            ValidationError::new(ErrorCode::NumberMultiple, "", "not a multiple"),
        ])
        .unwrap();
        assert_eq!(agg.code, ErrorCode::Multiple);
        assert_eq!(agg.causes.len(), 2);
        assert_eq!(agg.leaves().len(), 2);
        assert!(agg.message.contains("NMIN"));
    }

    #[test]
    fn test_display_includes_path() {
        let err = ValidationError::new(ErrorCode::StringMin, "/2", "too short");
        assert_eq!(err.to_string(), "[SMIN] too short [at /2]");
    }

    #[test]
    fn test_prefixed_reroots_causes() {
        let agg = ValidationError::aggregate(vec![
            ValidationError::new(ErrorCode::Type, "/a", "x"),
            ValidationError::new(ErrorCode::Type, "/b", "y"),
        ])
        .unwrap()
        .prefixed("/root");
        assert_eq!(agg.causes[0].path, "/root/a");
        assert_eq!(agg.causes[1].path, "/root/b");
    }

    #[test]
    fn test_enforcer_error_codes() {
        let e = EnforcerError::from(FormatError::syntax("a date", "x"));
        assert_eq!(e.code(), Some(ErrorCode::Format));
        let e = EnforcerError::Detached { path: "/a".into() };
        assert_eq!(e.code(), Some(ErrorCode::Proxy));
        let e = EnforcerError::Schema(SchemaError::NotAnObject { path: "#".into() });
        assert_eq!(e.code(), None);
    }
}
