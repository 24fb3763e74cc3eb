//! Opaque pagination cursors.
//!
//! A cursor is the canonical JSON of the wire-format key map: object keys are
//! sorted at every level, so equal keys always encode to the same string.

use dynaquery_model::Item;

use crate::error::{ExpressionError, ExpressionResult};

/// Encode a `LastEvaluatedKey` into a cursor.
#[must_use]
pub fn encode_cursor(key: &Item) -> String {
    // `serde_json::Map` keeps keys sorted, which makes the output canonical.
    serde_json::to_value(key).map_or_else(|_| String::from("{}"), |v| v.to_string())
}

/// Decode a cursor into an `ExclusiveStartKey`.
///
/// Absent or blank cursors, and the empty object `{}`, mean "start from the
/// beginning" and yield `None`.
///
/// # Errors
///
/// Returns [`ExpressionError::Cursor`] if the cursor is not a JSON object of
/// attribute values.
pub fn decode_cursor(cursor: Option<&str>) -> ExpressionResult<Option<Item>> {
    let Some(cursor) = cursor.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    serde_json::from_str::<Item>(cursor)
        .map(|key| (!key.is_empty()).then_some(key))
        .map_err(|e| ExpressionError::Cursor {
            reason: e.to_string(),
        })
}
