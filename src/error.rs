//! Normalization error types.
//!
//! Two user-facing error kinds, both surfaced verbatim to the query
//! submitter:
//!
//! - [`QueryError::InvalidQuery`]: the query violates a static semantic
//!   rule (undefined-variable use, aggregate-consistency violation,
//!   alias-target collision, ...).
//! - [`QueryError::NotSupported`]: the query is valid under the query
//!   language's general semantics but exercises a combination this
//!   engine does not implement. The message always carries an
//!   explanatory note and, where applicable, a suggested rewrite.
//!
//! Any failure aborts resolution of the whole query; the caller reports
//! the error and discards the partially mutated query. These errors are
//! deterministic functions of the query text, so nothing is retried.

use crate::var::Variable;
use serde::Serialize;
use thiserror::Error;

/// Structured metadata attached to a normalization error.
///
/// Records the offending variables for precise reporting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ErrorMetadata {
    /// Variables the error is about (may be empty)
    pub variables: Vec<Variable>,
}

impl ErrorMetadata {
    /// Metadata naming a single variable.
    pub fn for_variable(variable: Variable) -> Self {
        Self {
            variables: vec![variable],
        }
    }

    /// Metadata naming several variables.
    pub fn for_variables(variables: Vec<Variable>) -> Self {
        Self { variables }
    }
}

/// Error raised by the solution-modifier resolver and its helpers.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query violates a static semantic rule.
    #[error("Invalid query: {message}")]
    InvalidQuery {
        message: String,
        metadata: ErrorMetadata,
    },

    /// The query is valid but not implemented by this engine.
    #[error("Not supported: {message}")]
    NotSupported {
        message: String,
        metadata: ErrorMetadata,
    },
}

impl QueryError {
    /// Create an invalid-query error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
            metadata: ErrorMetadata::default(),
        }
    }

    /// Create an invalid-query error naming one variable.
    pub fn invalid_for_variable(variable: Variable, message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
            metadata: ErrorMetadata::for_variable(variable),
        }
    }

    /// Create an invalid-query error naming several variables.
    pub fn invalid_for_variables(variables: Vec<Variable>, message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
            metadata: ErrorMetadata::for_variables(variables),
        }
    }

    /// Create a not-supported error.
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported {
            message: message.into(),
            metadata: ErrorMetadata::default(),
        }
    }

    /// Create a not-supported error carrying metadata from an
    /// underlying failure.
    pub fn not_supported_with_metadata(message: impl Into<String>, metadata: ErrorMetadata) -> Self {
        Self::NotSupported {
            message: message.into(),
            metadata,
        }
    }

    /// The error message without the kind prefix.
    ///
    /// Used when a [`QueryError::NotSupported`] wraps the message of an
    /// underlying [`QueryError::InvalidQuery`].
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidQuery { message, .. } => message,
            Self::NotSupported { message, .. } => message,
        }
    }

    /// The structured metadata.
    pub fn metadata(&self) -> &ErrorMetadata {
        match self {
            Self::InvalidQuery { metadata, .. } => metadata,
            Self::NotSupported { metadata, .. } => metadata,
        }
    }

    /// Consume the error, keeping only its metadata.
    pub fn into_metadata(self) -> ErrorMetadata {
        match self {
            Self::InvalidQuery { metadata, .. } => metadata,
            Self::NotSupported { metadata, .. } => metadata,
        }
    }

    /// Whether this is an invalid-query error.
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, Self::InvalidQuery { .. })
    }

    /// Whether this is a not-supported error.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported { .. })
    }
}

/// Result type for normalization operations.
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_prefix() {
        let err = QueryError::invalid("?x is not defined");
        assert_eq!(err.to_string(), "Invalid query: ?x is not defined");
        assert_eq!(err.message(), "?x is not defined");

        let err = QueryError::not_supported("ordering by an expression");
        assert_eq!(err.to_string(), "Not supported: ordering by an expression");
    }

    #[test]
    fn test_metadata_round_trip() {
        let var = Variable::new("x");
        let err = QueryError::invalid_for_variable(var.clone(), "boom");
        assert_eq!(err.metadata().variables, vec![var.clone()]);

        let wrapped =
            QueryError::not_supported_with_metadata("boom, but softer", err.into_metadata());
        assert!(wrapped.is_not_supported());
        assert_eq!(wrapped.metadata().variables, vec![var]);
    }
}
