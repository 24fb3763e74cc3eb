//! Conversion between `(raw string, type tag)` pairs and typed values.
//!
//! Query-string style input only carries strings, so each value travels with
//! a type tag (`S`, `N`, `BOOL`, `M`, ...). Map and list values are JSON in the
//! raw string; set values are comma-separated.

use base64::Engine;
use dynaquery_model::{AttributeValue, TypeTag};
use serde_json::Value;
use tracing::debug;

use crate::error::{ExpressionError, ExpressionResult};

/// Parse a raw string according to a type tag.
///
/// # Errors
///
/// Returns [`ExpressionError::UnsupportedType`] for an unknown tag, malformed
/// JSON behind `M`/`L`, a non-numeric `N`, a non-boolean `BOOL` or invalid
/// base64 behind `B`. Malformed items inside an `NS` are dropped instead.
pub fn parse_typed_value(raw: &str, type_tag: &str) -> ExpressionResult<AttributeValue> {
    let tag = TypeTag::parse(type_tag)
        .ok_or_else(|| ExpressionError::unsupported_type(type_tag, "unknown type tag"))?;
    parse_tagged(raw, tag)
}

/// Parse a raw string for an already-resolved tag.
///
/// # Errors
///
/// See [`parse_typed_value`].
pub fn parse_tagged(raw: &str, tag: TypeTag) -> ExpressionResult<AttributeValue> {
    let value = match tag {
        TypeTag::String => AttributeValue::S(raw.to_owned()),
        TypeTag::Number => {
            let n = raw.trim();
            if !is_number(n) {
                return Err(ExpressionError::unsupported_type(
                    tag.as_str(),
                    format!("'{raw}' is not a number"),
                ));
            }
            AttributeValue::N(n.to_owned())
        }
        TypeTag::Boolean => match raw.trim() {
            b if b.eq_ignore_ascii_case("true") => AttributeValue::Bool(true),
            b if b.eq_ignore_ascii_case("false") => AttributeValue::Bool(false),
            _ => {
                return Err(ExpressionError::unsupported_type(
                    tag.as_str(),
                    format!("'{raw}' is not a boolean"),
                ));
            }
        },
        TypeTag::Null => AttributeValue::Null(true),
        TypeTag::Binary => base64::engine::general_purpose::STANDARD
            .decode(raw.trim())
            .map(|b| AttributeValue::B(b.into()))
            .map_err(|e| ExpressionError::unsupported_type(tag.as_str(), e.to_string()))?,
        TypeTag::Map => match parse_json(raw, tag)? {
            map @ Value::Object(_) => from_json(map),
            _ => {
                return Err(ExpressionError::unsupported_type(
                    tag.as_str(),
                    "expected a JSON object",
                ));
            }
        },
        TypeTag::List => match parse_json(raw, tag)? {
            list @ Value::Array(_) => from_json(list),
            _ => {
                return Err(ExpressionError::unsupported_type(
                    tag.as_str(),
                    "expected a JSON array",
                ));
            }
        },
        TypeTag::StringSet => AttributeValue::Ss(split_items(raw).map(str::to_owned).collect()),
        TypeTag::NumberSet => AttributeValue::Ns(
            split_items(raw)
                .filter(|item| {
                    let keep = is_number(item);
                    if !keep {
                        debug!(item, "dropping non-numeric number set item");
                    }
                    keep
                })
                .map(str::to_owned)
                .collect(),
        ),
        TypeTag::BinarySet => AttributeValue::Bs(
            split_items(raw)
                .map(|item| bytes::Bytes::copy_from_slice(item.as_bytes()))
                .collect(),
        ),
    };
    Ok(value)
}

/// Render a typed value back into its `(raw string, type tag)` pair.
///
/// The inverse of [`parse_typed_value`] for every value it produces, except
/// that set items and JSON are re-rendered in canonical form.
#[must_use]
pub fn format_typed_value(value: &AttributeValue) -> (String, TypeTag) {
    let raw = match value {
        AttributeValue::S(s) | AttributeValue::N(s) => s.clone(),
        AttributeValue::B(b) => base64::engine::general_purpose::STANDARD.encode(b),
        AttributeValue::Ss(items) | AttributeValue::Ns(items) => items.join(","),
        AttributeValue::Bs(items) => items
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect::<Vec<_>>()
            .join(","),
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Null(_) => String::new(),
        AttributeValue::L(_) | AttributeValue::M(_) => to_json(value).to_string(),
    };
    (raw, value.type_tag())
}

/// Marshal a plain JSON value into a typed value.
///
/// Strings become `S`, numbers `N`, booleans `BOOL`, `null` is `NULL`, arrays
/// `L` and objects `M`.
#[must_use]
pub fn from_json(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(items) => AttributeValue::L(items.into_iter().map(from_json).collect()),
        Value::Object(map) => {
            AttributeValue::M(map.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
    }
}

/// Unmarshal a typed value into plain JSON.
///
/// Sets become arrays and binary becomes base64 text, so this is lossy for
/// those variants.
#[must_use]
pub fn to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n),
        AttributeValue::B(b) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(b))
        }
        AttributeValue::Ss(items) => items.iter().cloned().map(Value::String).collect(),
        AttributeValue::Ns(items) => items.iter().map(|n| number_to_json(n)).collect(),
        AttributeValue::Bs(items) => items
            .iter()
            .map(|b| Value::String(base64::engine::general_purpose::STANDARD.encode(b)))
            .collect(),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => items.iter().map(to_json).collect(),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
    }
}

fn number_to_json(n: &str) -> Value {
    serde_json::from_str::<serde_json::Number>(n)
        .map_or_else(|_| Value::String(n.to_owned()), Value::Number)
}

fn parse_json(raw: &str, tag: TypeTag) -> ExpressionResult<Value> {
    serde_json::from_str(raw).map_err(|e| {
        ExpressionError::unsupported_type(tag.as_str(), format!("malformed JSON: {e}"))
    })
}

fn split_items(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.parse::<f64>().is_ok_and(f64::is_finite)
}
