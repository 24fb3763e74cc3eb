//! Error taxonomy of the expression layer.
//!
//! Nothing in this crate recovers from these; each one carries enough context
//! (field paths, offending token) for a transport layer to render it through
//! [`ExpressionError::to_response`].

use std::fmt;

use dynaquery_model::error::{ErrorCode, ErrorResponse, FieldViolation};

/// Every field constraint a query request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Violations in the order the constraints were evaluated.
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Wrap a non-empty list of violations.
    #[must_use]
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    /// Shorthand for a single violation.
    #[must_use]
    pub fn single(path: &str, message: impl Into<String>) -> Self {
        Self::new(vec![FieldViolation::new(path, message)])
    }

    /// Offending field paths.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.path.as_str())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Errors produced while building commands or forwarding them.
#[derive(Debug, thiserror::Error)]
pub enum ExpressionError {
    /// The query request failed schema or conditional-field validation.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown comparator, or a comparator missing an operand.
    #[error("invalid comparator '{token}': {reason}")]
    Comparator {
        /// The comparator as supplied.
        token: String,
        /// Explanation.
        reason: String,
    },

    /// Unknown type tag, or a raw value that does not fit its tag.
    #[error("unsupported value for type '{type_tag}': {reason}")]
    UnsupportedType {
        /// The type tag as supplied.
        type_tag: String,
        /// Explanation.
        reason: String,
    },

    /// The pagination cursor could not be decoded.
    #[error("invalid pagination cursor: {reason}")]
    Cursor {
        /// Explanation.
        reason: String,
    },

    /// An update carried neither an expression nor any field.
    #[error("update requires an update expression or at least one field")]
    EmptyUpdate,

    /// The storage client failed; passed through untouched.
    #[error("storage engine error: {0:#}")]
    StorageEngine(anyhow::Error),
}

/// Convenience result type for the expression layer.
pub type ExpressionResult<T> = Result<T, ExpressionError>;

impl ExpressionError {
    pub(crate) fn comparator(token: &str, reason: impl Into<String>) -> Self {
        Self::Comparator {
            token: token.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported_type(type_tag: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_tag: type_tag.to_owned(),
            reason: reason.into(),
        }
    }

    /// The wire error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::Comparator { .. } => ErrorCode::ComparatorError,
            Self::UnsupportedType { .. } => ErrorCode::UnsupportedTypeError,
            Self::Cursor { .. } => ErrorCode::CursorError,
            Self::EmptyUpdate => ErrorCode::EmptyUpdateError,
            Self::StorageEngine(_) => ErrorCode::StorageEngineError,
        }
    }

    /// HTTP status a transport layer should answer with.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        self.code().default_status_code()
    }

    /// `true` for errors the caller caused (the 4xx family).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Render the client-facing error body.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        let response = ErrorResponse::new(self.code(), self.to_string());
        match self {
            Self::Validation(v) => response.with_fields(v.violations.clone()),
            _ => response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_carry_field_paths_into_response() {
        let err: ExpressionError = ValidationError::new(vec![
            FieldViolation::new("skValue", "is required when skComparator is set"),
            FieldViolation::new("skType", "is required when skComparator is set"),
        ])
        .into();

        assert_eq!(err.code(), ErrorCode::ValidationError);
        let body = err.to_response();
        let paths: Vec<_> = body.fields.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["skValue", "skType"]);
        assert!(body.message.contains("skValue: is required"));
    }

    #[test]
    fn test_should_classify_storage_errors_as_server_errors() {
        let err = ExpressionError::StorageEngine(anyhow::anyhow!("throttled"));
        assert!(!err.is_client_error());
        assert_eq!(err.status_code(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "storage engine error: throttled");
    }

    #[test]
    fn test_should_name_offending_comparator_token() {
        let err = ExpressionError::comparator("sideways", "unknown comparator");
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "invalid comparator 'sideways': unknown comparator"
        );
    }
}
