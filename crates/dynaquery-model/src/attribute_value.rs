//! The typed attribute value and its type tags.
//!
//! On the wire every value is a one-entry object keyed by its [`TypeTag`],
//! e.g. `{"S": "hello"}` or `{"NS": ["1", "2"]}`.

use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An item, key or cursor: attribute name to typed value.
pub type Item = HashMap<String, AttributeValue>;

/// Type descriptor of an attribute value.
///
/// Parsed case-insensitively from client input; always rendered in the
/// upper-case wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `S`
    String,
    /// `N`
    Number,
    /// `B`
    Binary,
    /// `BOOL`
    Boolean,
    /// `NULL`
    Null,
    /// `M`
    Map,
    /// `L`
    List,
    /// `SS`
    StringSet,
    /// `NS`
    NumberSet,
    /// `BS`
    BinarySet,
}

impl TypeTag {
    /// Every tag, in wire order.
    pub const ALL: [Self; 10] = [
        Self::String,
        Self::Number,
        Self::Binary,
        Self::StringSet,
        Self::NumberSet,
        Self::BinarySet,
        Self::Boolean,
        Self::Null,
        Self::List,
        Self::Map,
    ];

    /// Returns the wire descriptor (e.g. `"S"`, `"BOOL"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "S",
            Self::Number => "N",
            Self::Binary => "B",
            Self::Boolean => "BOOL",
            Self::Null => "NULL",
            Self::Map => "M",
            Self::List => "L",
            Self::StringSet => "SS",
            Self::NumberSet => "NS",
            Self::BinarySet => "BS",
        }
    }

    /// Parse a descriptor, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed value stored under an attribute name.
///
/// Numbers stay strings so no precision is lost in transit.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// String value.
    S(String),
    /// Number value (string-encoded).
    N(String),
    /// Raw bytes; base64 text on the wire.
    B(bytes::Bytes),
    /// String set.
    Ss(Vec<String>),
    /// Number set (string-encoded).
    Ns(Vec<String>),
    /// Binary set (base64-encoded in JSON).
    Bs(Vec<bytes::Bytes>),
    /// Boolean value.
    Bool(bool),
    /// Null value.
    Null(bool),
    /// Ordered, heterogeneous list.
    L(Vec<AttributeValue>),
    /// Nested document.
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Returns the type tag of this value.
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::S(_) => TypeTag::String,
            Self::N(_) => TypeTag::Number,
            Self::B(_) => TypeTag::Binary,
            Self::Ss(_) => TypeTag::StringSet,
            Self::Ns(_) => TypeTag::NumberSet,
            Self::Bs(_) => TypeTag::BinarySet,
            Self::Bool(_) => TypeTag::Boolean,
            Self::Null(_) => TypeTag::Null,
            Self::L(_) => TypeTag::List,
            Self::M(_) => TypeTag::Map,
        }
    }

    /// Returns the string if this is an `S` variant.
    #[must_use]
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Number text of an `N`.
    #[must_use]
    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    /// Value of a `BOOL`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Entries of an `M`.
    #[must_use]
    pub fn as_m(&self) -> Option<&HashMap<String, AttributeValue>> {
        match self {
            Self::M(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.type_tag();
        match self {
            Self::S(s) => write!(f, "{{{tag}: {s}}}"),
            Self::N(n) => write!(f, "{{{tag}: {n}}}"),
            Self::B(b) => write!(f, "{{{tag}: {} bytes}}", b.len()),
            Self::Ss(v) | Self::Ns(v) => write!(f, "{{{tag}: {v:?}}}"),
            Self::Bs(v) => write!(f, "{{{tag}: {} items}}", v.len()),
            Self::Bool(b) | Self::Null(b) => write!(f, "{{{tag}: {b}}}"),
            Self::L(v) => write!(f, "{{{tag}: {} items}}", v.len()),
            Self::M(m) => write!(f, "{{{tag}: {} keys}}", m.len()),
        }
    }
}

fn encode_b64(b: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(b)
}

fn decode_b64<E: de::Error>(s: &str) -> Result<bytes::Bytes, E> {
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map(bytes::Bytes::from)
        .map_err(E::custom)
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        let tag = self.type_tag().as_str();
        match self {
            Self::S(s) | Self::N(s) => map.serialize_entry(tag, s)?,
            Self::B(b) => map.serialize_entry(tag, &encode_b64(b))?,
            Self::Ss(v) | Self::Ns(v) => map.serialize_entry(tag, v)?,
            Self::Bs(v) => {
                let encoded: Vec<String> = v.iter().map(|b| encode_b64(b)).collect();
                map.serialize_entry(tag, &encoded)?;
            }
            Self::Bool(b) | Self::Null(b) => map.serialize_entry(tag, b)?,
            Self::L(list) => map.serialize_entry(tag, list)?,
            Self::M(m) => map.serialize_entry(tag, m)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributeValueVisitor)
    }
}

struct AttributeValueVisitor;

impl<'de> Visitor<'de> for AttributeValueVisitor {
    type Value = AttributeValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an attribute value object with exactly one type key")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let Some(key) = map.next_key::<String>()? else {
            return Err(de::Error::custom(
                "attribute value must have exactly one key",
            ));
        };

        // The wire format is strict about case even though client tags are not.
        let tag = TypeTag::ALL
            .into_iter()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| {
                <M::Error as de::Error>::unknown_field(
                    &key,
                    &["S", "N", "B", "SS", "NS", "BS", "BOOL", "NULL", "L", "M"],
                )
            })?;

        let value = match tag {
            TypeTag::String => AttributeValue::S(map.next_value()?),
            TypeTag::Number => AttributeValue::N(map.next_value()?),
            TypeTag::Binary => {
                let encoded: String = map.next_value()?;
                AttributeValue::B(decode_b64::<M::Error>(&encoded)?)
            }
            TypeTag::StringSet => AttributeValue::Ss(map.next_value()?),
            TypeTag::NumberSet => AttributeValue::Ns(map.next_value()?),
            TypeTag::BinarySet => {
                let encoded: Vec<String> = map.next_value()?;
                let decoded = encoded
                    .iter()
                    .map(|e| decode_b64::<M::Error>(e))
                    .collect::<Result<Vec<_>, _>>()?;
                AttributeValue::Bs(decoded)
            }
            TypeTag::Boolean => AttributeValue::Bool(map.next_value()?),
            TypeTag::Null => AttributeValue::Null(map.next_value()?),
            TypeTag::List => AttributeValue::L(map.next_value()?),
            TypeTag::Map => AttributeValue::M(map.next_value()?),
        };

        if map.next_key::<String>()?.is_some() {
            return Err(de::Error::custom(
                "attribute value must have exactly one key",
            ));
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_type_tag_case_insensitively() {
        assert_eq!(TypeTag::parse("bool"), Some(TypeTag::Boolean));
        assert_eq!(TypeTag::parse(" ns "), Some(TypeTag::NumberSet));
        assert_eq!(TypeTag::parse("M"), Some(TypeTag::Map));
        assert_eq!(TypeTag::parse("X"), None);
        assert_eq!(TypeTag::parse(""), None);
    }

    #[test]
    fn test_should_serialize_single_key_objects() {
        let json = serde_json::to_string(&AttributeValue::N("42".to_owned())).unwrap();
        assert_eq!(json, r#"{"N":"42"}"#);

        let json = serde_json::to_string(&AttributeValue::L(vec![
            AttributeValue::S("a".to_owned()),
            AttributeValue::Bool(true),
        ]))
        .unwrap();
        assert_eq!(json, r#"{"L":[{"S":"a"},{"BOOL":true}]}"#);
    }

    #[test]
    fn test_should_base64_encode_binary_sets() {
        let val = AttributeValue::Bs(vec![bytes::Bytes::from_static(b"hi")]);
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"BS":["aGk="]}"#);
        let back: AttributeValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, val);
    }

    #[test]
    fn test_should_reject_lowercase_wire_tag() {
        let err = serde_json::from_str::<AttributeValue>(r#"{"s":"x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_should_reject_multiple_keys() {
        let err = serde_json::from_str::<AttributeValue>(r#"{"S":"x","N":"1"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_should_deserialize_nested_map() {
        let val: AttributeValue =
            serde_json::from_str(r#"{"M":{"inner":{"NS":["1","2"]}}}"#).unwrap();
        let inner = val.as_m().and_then(|m| m.get("inner")).unwrap();
        assert!(matches!(inner, AttributeValue::Ns(v) if v.len() == 2));
    }
}
