//! Error types for wrapper-generation operations.
//!
//! All fallible operations in the workspace return [`Result`], which uses
//! the [`Error`] enum defined here. Variants carry enough context to name
//! the offending file, directive key, or value in diagnostics.
//!
//! # Examples
//!
//! ```
//! use molwrap_core::{Error, Result};
//!
//! fn classify(result: Result<()>) -> &'static str {
//!     match result {
//!         Ok(()) => "ok",
//!         Err(e) if e.is_validation() => "validation",
//!         Err(_) => "other",
//!     }
//! }
//!
//! let err = Error::MalformedDirective {
//!     key: "Context.setPositions".to_string(),
//!     reason: "duplicate entry".to_string(),
//! };
//! assert_eq!(classify(Err(err)), "other");
//! ```

use std::path::PathBuf;

/// Errors that can occur while loading, saving, or validating wrapper
/// generation inputs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading an input file failed.
    #[error("failed to read {}", path.display())]
    Read {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing an output file failed.
    #[error("failed to write {}", path.display())]
    Write {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Parsing input data failed.
    #[error("{message}")]
    Parse {
        /// Full description of what failed to parse and why.
        message: String,
        /// Underlying parser error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serializing data for persistence failed.
    #[error("{message}")]
    Serialize {
        /// Full description of what failed to serialize and why.
        message: String,
        /// Underlying serializer error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A unit expression was empty or whitespace-only.
    #[error("invalid unit expression {value:?}: expression must not be blank")]
    InvalidUnitExpr {
        /// The rejected expression text.
        value: String,
    },

    /// A single directive entry is malformed.
    #[error("malformed directive {key}: {reason}")]
    MalformedDirective {
        /// Directive key, formatted as `Class.method` (or just the class).
        key: String,
        /// What is wrong with the entry.
        reason: String,
    },

    /// Cross-reference validation against an API surface failed.
    ///
    /// Carries every issue found rather than stopping at the first, so a
    /// stale directive table can be repaired in one pass.
    #[error("directive validation failed with {} issue(s): {}", issues.len(), issues.join("; "))]
    Validation {
        /// Human-readable description of each mismatch, sorted by key.
        issues: Vec<String>,
    },
}

impl Error {
    /// Returns `true` if this is a file read error.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Read { .. })
    }

    /// Returns `true` if this is a file write error.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }

    /// Returns `true` if this is a parse error.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Returns `true` if this is a serialization error.
    #[must_use]
    pub const fn is_serialize(&self) -> bool {
        matches!(self, Self::Serialize { .. })
    }

    /// Returns `true` if this error rejects a single malformed directive.
    #[must_use]
    pub const fn is_malformed_directive(&self) -> bool {
        matches!(self, Self::MalformedDirective { .. })
    }

    /// Returns `true` if this error came from the cross-reference
    /// validation pass.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns the collected validation issues, if this is a
    /// [`Error::Validation`].
    #[must_use]
    pub fn validation_issues(&self) -> Option<&[String]> {
        match self {
            Self::Validation { issues } => Some(issues),
            _ => None,
        }
    }
}

/// Convenience result type for wrapper-generation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_path() {
        let err = Error::Read {
            path: PathBuf::from("/tmp/directives.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/tmp/directives.toml"));
        assert!(err.is_read());
        assert!(!err.is_write());
    }

    #[test]
    fn test_malformed_directive_display() {
        let err = Error::MalformedDirective {
            key: "System.addForce".to_string(),
            reason: "duplicate entry".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed directive System.addForce: duplicate entry"
        );
        assert!(err.is_malformed_directive());
    }

    #[test]
    fn test_validation_display_joins_issues() {
        let err = Error::Validation {
            issues: vec!["first".to_string(), "second".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("2 issue(s)"));
        assert!(text.contains("first; second"));
        assert_eq!(err.validation_issues().map(<[String]>::len), Some(2));
    }

    #[test]
    fn test_invalid_unit_expr_display_quotes_value() {
        let err = Error::InvalidUnitExpr {
            value: "   ".to_string(),
        };
        assert!(err.to_string().contains("\"   \""));
    }

    #[test]
    fn test_errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
