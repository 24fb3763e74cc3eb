//! `SET` clause generation for partial-entity updates.

use std::collections::HashMap;

use dynaquery_model::AttributeValue;
use tracing::debug;

use crate::error::{ExpressionError, ExpressionResult};
use crate::resolver::ExpressionAttributes;

/// What an update should do.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateSpec {
    /// A caller-written update expression with its own placeholders, passed
    /// through unchanged.
    Expression {
        /// The update expression.
        expression: String,
        /// Placeholders it references.
        attributes: ExpressionAttributes,
    },
    /// Fields to overwrite, in assignment order.
    Entity(Vec<(String, AttributeValue)>),
}

impl UpdateSpec {
    /// Fields to overwrite, in iteration order.
    #[must_use]
    pub fn entity<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, AttributeValue)>,
        K: Into<String>,
    {
        Self::Entity(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// A caller-written expression.
    #[must_use]
    pub fn expression(expression: impl Into<String>, attributes: ExpressionAttributes) -> Self {
        Self::Expression {
            expression: expression.into(),
            attributes,
        }
    }
}

/// A finished update expression and its merged placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateClause {
    /// The update expression.
    pub expression: String,
    /// Generated placeholders merged with the caller's extras.
    pub attributes: ExpressionAttributes,
}

/// Build the update expression for `spec`.
///
/// `extras` are placeholders the caller already uses elsewhere in the same
/// request (a condition expression, typically). Generated value placeholders
/// never collide with them: `:<field>` is tried first, then
/// `:<field>_update_1`, `:<field>_update_2`, and so on. Reserved field names
/// are aliased on the left-hand side of each assignment, without rebinding
/// any alias `extras` already uses.
///
/// # Errors
///
/// Returns [`ExpressionError::EmptyUpdate`] when the expression is blank or
/// the entity has no fields.
pub fn build_update(
    spec: &UpdateSpec,
    extras: &ExpressionAttributes,
) -> ExpressionResult<UpdateClause> {
    match spec {
        UpdateSpec::Expression {
            expression,
            attributes,
        } => {
            if expression.trim().is_empty() {
                return Err(ExpressionError::EmptyUpdate);
            }
            Ok(UpdateClause {
                expression: expression.clone(),
                attributes: attributes.clone().merge(extras),
            })
        }
        UpdateSpec::Entity(fields) => {
            if fields.is_empty() {
                return Err(ExpressionError::EmptyUpdate);
            }

            // Seeded with the caller's aliases so a generated `#name` never
            // rebinds one of them.
            let mut generated =
                ExpressionAttributes::from_parts(extras.names.clone(), HashMap::new());
            let mut assignments = Vec::with_capacity(fields.len());
            for (field, value) in fields {
                let placeholder = free_placeholder(field, &generated, extras);
                let target = generated.alias_name(field);
                assignments.push(format!("{target} = {placeholder}"));
                generated.insert_value(placeholder, value.clone());
            }

            let expression = format!("SET {}", assignments.join(", "));
            debug!(%expression, fields = fields.len(), "generated update expression");
            Ok(UpdateClause {
                expression,
                attributes: generated.merge(extras),
            })
        }
    }
}

fn free_placeholder(
    field: &str,
    generated: &ExpressionAttributes,
    extras: &ExpressionAttributes,
) -> String {
    let taken = |p: &str| generated.has_value(p) || extras.has_value(p);
    let nominal = format!(":{field}");
    if !taken(&nominal) {
        return nominal;
    }
    (1u32..)
        .map(|n| format!(":{field}_update_{n}"))
        .find(|p| !taken(p))
        .unwrap_or(nominal)
}
