//! Key-condition expression synthesis.
//!
//! Every expression starts with the partition-key equality `#pk = :pk`; a
//! sort-key term is appended according to the comparator. Only placeholders
//! that appear in the expression are registered, since the engine rejects
//! unused ones.

use std::fmt;

use dynaquery_model::AttributeValue;
use tracing::debug;

use crate::error::{ExpressionError, ExpressionResult};
use crate::resolver::ExpressionAttributes;

/// Partition-key name alias.
pub const PK_NAME: &str = "#pk";
/// Partition-key value placeholder.
pub const PK_VALUE: &str = ":pk";
/// Sort-key name alias.
pub const SK_NAME: &str = "#sk";
/// Sort-key value placeholder.
pub const SK_VALUE: &str = ":sk";
/// Placeholder for `begins_with` prefixes and `between` upper bounds.
pub const SK_VALUE2: &str = ":skValue2";

/// Relational operator applied to the sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Comparator {
    /// `=`
    #[default]
    Equals,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// `begins_with(#sk, ...)`
    BeginsWith,
    /// `#sk BETWEEN ... AND ...`
    Between,
}

impl Comparator {
    /// Resolve a client token, ignoring case, `_`, `-` and spaces.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::Comparator`] for an unrecognized token.
    pub fn parse(token: &str) -> ExpressionResult<Self> {
        let normalized: String = token
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        let comparator = match normalized.as_str() {
            "=" | "eq" | "equal" | "equals" => Self::Equals,
            "<" | "lt" | "lessthan" => Self::LessThan,
            ">" | "gt" | "greaterthan" => Self::GreaterThan,
            "<=" | "le" | "lte" | "lessorequal" | "lessthanorequal" => Self::LessOrEqual,
            ">=" | "ge" | "gte" | "greaterorequal" | "greaterthanorequal" => {
                Self::GreaterOrEqual
            }
            "beginswith" | "startswith" => Self::BeginsWith,
            "between" => Self::Between,
            _ => return Err(ExpressionError::comparator(token, "unknown comparator")),
        };
        Ok(comparator)
    }

    /// The infix operator, for the plain relational comparators.
    #[must_use]
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            Self::Equals => Some("="),
            Self::LessThan => Some("<"),
            Self::GreaterThan => Some(">"),
            Self::LessOrEqual => Some("<="),
            Self::GreaterOrEqual => Some(">="),
            Self::BeginsWith | Self::Between => None,
        }
    }

    /// Canonical name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::LessThan => "less_than",
            Self::GreaterThan => "greater_than",
            Self::LessOrEqual => "less_or_equal",
            Self::GreaterOrEqual => "greater_or_equal",
            Self::BeginsWith => "begins_with",
            Self::Between => "between",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key attribute: its name and typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyAttribute {
    /// Attribute name in the table or index.
    pub property: String,
    /// Typed value.
    pub value: AttributeValue,
}

impl KeyAttribute {
    /// Pair a name with a value.
    #[must_use]
    pub fn new(property: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            property: property.into(),
            value,
        }
    }
}

/// Inputs of one key condition.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyConditionInput {
    /// Partition key.
    pub partition: KeyAttribute,
    /// Sort key, if the query constrains it.
    pub sort: Option<KeyAttribute>,
    /// Upper bound for `between`.
    pub sort_value2: Option<AttributeValue>,
    /// Comparator token; `None` means equals.
    pub comparator: Option<String>,
}

/// A key-condition expression and the placeholders it references.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    /// The expression, e.g. `#pk = :pk AND #sk = :sk`.
    pub expression: String,
    /// `#pk`/`#sk` aliases and `:pk`/`:sk`/`:skValue2` values.
    pub attributes: ExpressionAttributes,
}

/// Build the key-condition expression.
///
/// # Errors
///
/// Returns [`ExpressionError::Comparator`] for an unknown comparator,
/// `begins_with` without a sort key, or `between` without both bounds.
pub fn build_key_condition(input: &KeyConditionInput) -> ExpressionResult<KeyCondition> {
    let comparator = input
        .comparator
        .as_deref()
        .map(Comparator::parse)
        .transpose()?
        .unwrap_or_default();
    let token = input.comparator.as_deref().unwrap_or(comparator.as_str());

    let mut attributes = ExpressionAttributes::new();
    attributes.insert_name(PK_NAME, input.partition.property.clone());
    attributes.insert_value(PK_VALUE, input.partition.value.clone());
    let mut expression = format!("{PK_NAME} = {PK_VALUE}");

    let Some(sort) = &input.sort else {
        if matches!(comparator, Comparator::BeginsWith | Comparator::Between) {
            return Err(ExpressionError::comparator(
                token,
                format!("{comparator} requires a sort key value"),
            ));
        }
        debug!(%expression, "key condition without sort key");
        return Ok(KeyCondition {
            expression,
            attributes,
        });
    };

    attributes.insert_name(SK_NAME, sort.property.clone());
    match comparator {
        Comparator::BeginsWith => {
            attributes.insert_value(SK_VALUE2, sort.value.clone());
            expression.push_str(&format!(" AND begins_with({SK_NAME}, {SK_VALUE2})"));
        }
        Comparator::Between => {
            let Some(upper) = &input.sort_value2 else {
                return Err(ExpressionError::comparator(
                    token,
                    "between requires a second sort key value",
                ));
            };
            attributes.insert_value(SK_VALUE, sort.value.clone());
            attributes.insert_value(SK_VALUE2, upper.clone());
            expression.push_str(&format!(
                " AND {SK_NAME} BETWEEN {SK_VALUE} AND {SK_VALUE2}"
            ));
        }
        relational => {
            // Every remaining comparator has an infix operator.
            let op = relational.operator().unwrap_or("=");
            attributes.insert_value(SK_VALUE, sort.value.clone());
            expression.push_str(&format!(" AND {SK_NAME} {op} {SK_VALUE}"));
        }
    }

    debug!(%expression, %comparator, "built key condition");
    Ok(KeyCondition {
        expression,
        attributes,
    })
}
