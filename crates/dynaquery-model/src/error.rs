//! Error codes and the client-facing error body.
//!
//! The expression layer never renders HTTP itself; it hands an
//! [`ErrorResponse`] and a status code to whatever transport surrounds it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every kind of failure the expression layer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Schema or conditional-field violation in a query request.
    ValidationError,
    /// Unknown comparator, or a comparator missing its operands.
    ComparatorError,
    /// Unknown type tag, or a raw value that does not fit its tag.
    UnsupportedTypeError,
    /// Pagination cursor that cannot be decoded.
    CursorError,
    /// Update with neither an expression nor any field.
    EmptyUpdateError,
    /// Failure reported by the storage client.
    StorageEngineError,
}

impl ErrorCode {
    /// Code as rendered in error bodies.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "ValidationError",
            Self::ComparatorError => "ComparatorError",
            Self::UnsupportedTypeError => "UnsupportedTypeError",
            Self::CursorError => "CursorError",
            Self::EmptyUpdateError => "EmptyUpdateError",
            Self::StorageEngineError => "StorageEngineError",
        }
    }

    /// Status a transport layer answers with.
    ///
    /// Everything the caller can fix is a 400; storage failures are a 500.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::StorageEngineError => http::StatusCode::INTERNAL_SERVER_ERROR,
            _ => http::StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Path of the offending field, using the raw parameter name.
    pub path: String,
    /// What is wrong with it.
    pub message: String,
}

impl FieldViolation {
    /// Create a violation for `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// JSON error body for a client-facing response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// The error code.
    pub code: ErrorCode,
    /// A human-readable message.
    pub message: String,
    /// Offending fields, for validation errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldViolation>,
}

impl ErrorResponse {
    /// Create an error body without field details.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Attach field violations.
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<FieldViolation>) -> Self {
        self.fields = fields;
        self
    }

    /// HTTP status this body should be sent with.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        self.code.default_status_code()
    }
}
