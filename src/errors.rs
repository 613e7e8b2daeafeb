//! Shared error types for the application

use crate::ast::{Diagnostic, TypeKind};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cppsig operations
#[derive(Debug, Error)]
pub enum Error {
    /// A scalar kind with no entry in the canonical type table
    #[error("unresolved type `{spelling}` (kind {kind})")]
    UnresolvedType { kind: TypeKind, spelling: String },

    /// A method display name without a `(` delimiter
    #[error("malformed method display name `{display_name}`: expected `name(args...)`")]
    MalformedDisplayName { display_name: String },

    /// A record that does not follow the `length`/`data` array layout
    #[error("record `{record}` is not an array shape: {reason}")]
    ArrayShapeMismatch { record: String, reason: String },

    /// The AST producer could not parse the source
    #[error("failed to parse {}: {}", .path.display(), summarize(.diagnostics))]
    ParseFailure {
        path: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },

    /// Two class definitions with the same qualified name under the
    /// rejecting collision policy
    #[error("duplicate class `{qualified_name}`")]
    DuplicateClass { qualified_name: String },

    /// Unusable compiler-style argument
    #[error("Invalid compiler argument: {0}")]
    InvalidArgument(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// File system related errors
    #[error("File system error: {message}")]
    FileSystem {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Grammar could not be loaded into the parser
    #[error(transparent)]
    Language(#[from] tree_sitter::LanguageError),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a file system error with path context
    pub fn file_system(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: Some(path.into()),
            source: Some(source),
        }
    }

    pub fn array_shape_mismatch(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ArrayShapeMismatch {
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// Errors caused by the shape of the introspected data rather than by
    /// the environment. Callers may skip the offending method and go on.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedType { .. }
                | Self::MalformedDisplayName { .. }
                | Self::ArrayShapeMismatch { .. }
        )
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    match diagnostics.first() {
        Some(first) if diagnostics.len() > 1 => {
            format!("{first} (and {} more)", diagnostics.len() - 1)
        }
        Some(first) => first.to_string(),
        None => "no diagnostics reported".to_string(),
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceLocation;

    #[test]
    fn test_structural_classification() {
        assert!(Error::MalformedDisplayName {
            display_name: "foo".into()
        }
        .is_structural());
        assert!(Error::array_shape_mismatch("Array", "missing member `data`").is_structural());
        assert!(!Error::Configuration("bad".into()).is_structural());
    }

    #[test]
    fn test_parse_failure_message_mentions_first_diagnostic() {
        let location = SourceLocation {
            path: PathBuf::from("broken.hpp"),
            line: 2,
            column: 5,
        };
        let error = Error::ParseFailure {
            path: PathBuf::from("broken.hpp"),
            diagnostics: vec![
                Diagnostic::error("syntax error", location.clone()),
                Diagnostic::error("expected ';'", location),
            ],
        };
        assert_eq!(
            error.to_string(),
            "failed to parse broken.hpp: broken.hpp:2:5: error: syntax error (and 1 more)"
        );
    }
}
