//! Operation names and write return-value policies.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four item operations dynaquery assembles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Read one item by key.
    GetItem,
    /// Write a full item.
    PutItem,
    /// Read one partition by key condition.
    Query,
    /// Modify attributes of one item.
    UpdateItem,
}

impl Operation {
    /// Wire name, as used in logs and spans.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetItem => "GetItem",
            Self::PutItem => "PutItem",
            Self::Query => "Query",
            Self::UpdateItem => "UpdateItem",
        }
    }

    /// Whether the operation writes.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self, Self::PutItem | Self::UpdateItem)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which attributes a write hands back.
///
/// Serialized in the `SCREAMING_SNAKE_CASE` form the store expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnValue {
    /// Nothing.
    #[default]
    None,
    /// The whole item before the write.
    AllOld,
    /// Touched attributes, before the write.
    UpdatedOld,
    /// The whole item after the write.
    AllNew,
    /// Touched attributes, after the write.
    UpdatedNew,
}

impl ReturnValue {
    /// Wire spelling.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::AllOld => "ALL_OLD",
            Self::UpdatedOld => "UPDATED_OLD",
            Self::AllNew => "ALL_NEW",
            Self::UpdatedNew => "UPDATED_NEW",
        }
    }

    /// Accept a client spelling, ignoring case and `_`/`-` separators
    /// (`all_new`, `AllNew`, `all-new`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let folded: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "none" => Some(Self::None),
            "allold" => Some(Self::AllOld),
            "updatedold" => Some(Self::UpdatedOld),
            "allnew" => Some(Self::AllNew),
            "updatednew" => Some(Self::UpdatedNew),
            _ => None,
        }
    }
}

impl fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
