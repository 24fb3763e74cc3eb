//! The structured, client-facing query request.

use std::fmt;

use dynaquery_model::AttributeValue;
use serde::{Deserialize, Serialize};

use crate::codec::format_typed_value;

/// Raw parameter names, also used as field paths in validation errors.
pub mod params {
    /// Partition key value.
    pub const PK_VALUE: &str = "pkValue";
    /// Partition key type tag.
    pub const PK_TYPE: &str = "pkType";
    /// Partition key attribute name.
    pub const PK_PROPERTY: &str = "pkProperty";
    /// Sort key value.
    pub const SK_VALUE: &str = "skValue";
    /// Sort key type tag.
    pub const SK_TYPE: &str = "skType";
    /// Sort key attribute name.
    pub const SK_PROPERTY: &str = "skProperty";
    /// Second sort key value, for `between`.
    pub const SK_VALUE2: &str = "skValue2";
    /// Type tag of the second sort key value.
    pub const SK_VALUE2_TYPE: &str = "skValue2Type";
    /// Sort key comparator.
    pub const SK_COMPARATOR: &str = "skComparator";
    /// Secondary index name.
    pub const INDEX_NAME: &str = "indexName";
    /// Page size.
    pub const LIMIT: &str = "limit";
    /// Pagination cursor.
    pub const CURSOR: &str = "lastEvaluatedKey";
    /// Sort direction.
    pub const SORTING: &str = "sorting";

    /// Every recognized parameter.
    pub const ALL: [&str; 13] = [
        PK_VALUE,
        PK_TYPE,
        PK_PROPERTY,
        SK_VALUE,
        SK_TYPE,
        SK_PROPERTY,
        SK_VALUE2,
        SK_VALUE2_TYPE,
        SK_COMPARATOR,
        INDEX_NAME,
        LIMIT,
        CURSOR,
        SORTING,
    ];
}

/// Sort-key traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending.
    #[serde(rename = "ASC")]
    Asc,
    /// Descending.
    #[serde(rename = "DESC")]
    Desc,
}

impl SortDirection {
    /// Normalize a client spelling; anything unrecognized is `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "forward" => Some(Self::Asc),
            "desc" | "descending" | "backward" | "reverse" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Value of `ScanIndexForward` for this direction.
    #[must_use]
    pub fn scan_index_forward(self) -> bool {
        matches!(self, Self::Asc)
    }

    /// Canonical spelling.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-partition query, as described by a client.
///
/// Values stay as raw strings with their type tags until the command is
/// assembled; [`crate::validation`] checks the structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Partition key value.
    pub pk_value: Option<String>,
    /// Partition key type tag.
    pub pk_type: Option<String>,
    /// Partition key attribute name.
    pub pk_property: Option<String>,
    /// Sort key value.
    pub sk_value: Option<String>,
    /// Sort key type tag.
    pub sk_type: Option<String>,
    /// Sort key attribute name.
    pub sk_property: Option<String>,
    /// Upper bound for `between`.
    pub sk_value2: Option<String>,
    /// Type tag of `sk_value2`; falls back to `sk_type`.
    pub sk_value2_type: Option<String>,
    /// Comparator applied to the sort key.
    pub sk_comparator: Option<String>,
    /// Secondary index to query.
    pub index_name: Option<String>,
    /// Page size.
    pub limit: Option<u32>,
    /// Opaque pagination cursor.
    pub last_evaluated_key: Option<String>,
    /// Sort-key traversal order.
    pub sorting: Option<SortDirection>,
}

impl QueryRequest {
    /// A request for every item under one partition key.
    #[must_use]
    pub fn for_partition(property: impl Into<String>, value: &AttributeValue) -> Self {
        let (raw, tag) = format_typed_value(value);
        Self {
            pk_value: Some(raw),
            pk_type: Some(tag.as_str().to_owned()),
            pk_property: Some(property.into()),
            ..Self::default()
        }
    }

    /// Add a sort-key condition.
    #[must_use]
    pub fn with_sort_key(
        mut self,
        property: impl Into<String>,
        comparator: impl Into<String>,
        value: &AttributeValue,
    ) -> Self {
        let (raw, tag) = format_typed_value(value);
        self.sk_property = Some(property.into());
        self.sk_comparator = Some(comparator.into());
        self.sk_value = Some(raw);
        self.sk_type = Some(tag.as_str().to_owned());
        self
    }

    /// Query a secondary index instead of the table.
    #[must_use]
    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Set the page size.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Type tag for the second range value.
    #[must_use]
    pub fn sk_value2_type_or_default(&self) -> Option<&str> {
        self.sk_value2_type.as_deref().or(self.sk_type.as_deref())
    }
}
