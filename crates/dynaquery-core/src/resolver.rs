//! Expression attribute name and value maps.
//!
//! Builders register the placeholders they generate here, reserved attribute
//! names are swapped for `#name` aliases, and caller-supplied extras are
//! merged on top. Names that are not reserved stay raw, so a finished
//! expression may freely mix `#alias` and plain attribute names.

use std::collections::HashMap;

use dynaquery_model::AttributeValue;
use tracing::debug;

use crate::reserved::is_reserved;

/// `#token -> rawName` and `:token -> value` maps for one expression set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionAttributes {
    /// Name aliases.
    pub names: HashMap<String, String>,
    /// Value placeholders.
    pub values: HashMap<String, AttributeValue>,
}

impl ExpressionAttributes {
    /// Empty maps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from caller-supplied maps.
    #[must_use]
    pub fn from_parts(
        names: HashMap<String, String>,
        values: HashMap<String, AttributeValue>,
    ) -> Self {
        Self { names, values }
    }

    /// Register a name alias.
    pub fn insert_name(&mut self, alias: impl Into<String>, raw: impl Into<String>) {
        self.names.insert(alias.into(), raw.into());
    }

    /// Register a value placeholder.
    pub fn insert_value(&mut self, placeholder: impl Into<String>, value: AttributeValue) {
        self.values.insert(placeholder.into(), value);
    }

    /// Whether `placeholder` is already taken.
    #[must_use]
    pub fn has_value(&self, placeholder: &str) -> bool {
        self.values.contains_key(placeholder)
    }

    /// Whether both maps are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.values.is_empty()
    }

    /// Merge `extras` over `self`; extras win on key collision.
    #[must_use]
    pub fn merge(mut self, extras: &Self) -> Self {
        for (alias, raw) in &extras.names {
            if let Some(previous) = self.names.insert(alias.clone(), raw.clone()) {
                if previous != *raw {
                    debug!(%alias, %previous, %raw, "caller name overrides generated alias");
                }
            }
        }
        for (placeholder, value) in &extras.values {
            self.values.insert(placeholder.clone(), value.clone());
        }
        self
    }

    /// Return the token to write for `raw` in an expression.
    ///
    /// Reserved words become `#raw` and the alias is registered; anything
    /// else is returned unchanged. An alias already bound to a different
    /// attribute is never rebound: `#raw_1`, `#raw_2`, ... are tried instead.
    pub fn alias_name(&mut self, raw: &str) -> String {
        if !is_reserved(raw) {
            return raw.to_owned();
        }
        let free = |alias: &String| self.names.get(alias).is_none_or(|bound| bound == raw);
        let nominal = format!("#{raw}");
        let alias = if free(&nominal) {
            nominal
        } else {
            (1u32..)
                .map(|n| format!("#{raw}_{n}"))
                .find(free)
                .unwrap_or(nominal)
        };
        debug!(%raw, %alias, "aliased reserved attribute name");
        self.names.insert(alias.clone(), raw.to_owned());
        alias
    }

    /// Alias every name of a projection list and join it.
    ///
    /// Blank entries are skipped; `None` if nothing is left.
    pub fn alias_projection<'a, I>(&mut self, names: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tokens: Vec<String> = names
            .into_iter()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| self.alias_name(n))
            .collect();
        (!tokens.is_empty()).then(|| tokens.join(", "))
    }

    /// Split the maps apart, for moving into a command input.
    #[must_use]
    pub fn into_parts(self) -> (HashMap<String, String>, HashMap<String, AttributeValue>) {
        (self.names, self.values)
    }
}

/// Split a comma-separated projection string into attribute names.
pub fn split_projection(projection: &str) -> impl Iterator<Item = &str> {
    projection.split(',').map(str::trim).filter(|n| !n.is_empty())
}
