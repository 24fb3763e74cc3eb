//! Outputs the storage client hands back for each command.

use serde::{Deserialize, Serialize};

use crate::attribute_value::Item;
use crate::operations::Operation;

/// Result of a single-item read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemOutput {
    /// The item, if one exists for the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
}

/// Result of a full-item write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemOutput {
    /// Attributes selected by `ReturnValues`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Item>,
}

/// One page of a partition read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryOutput {
    /// Matching items.
    #[serde(default)]
    pub items: Vec<Item>,

    /// Number of items returned.
    #[serde(default)]
    pub count: i32,

    /// Number of items evaluated before the filter.
    #[serde(default)]
    pub scanned_count: i32,

    /// Key to resume from; absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Item>,
}

/// Result of an attribute update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemOutput {
    /// Attributes selected by `ReturnValues`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Item>,
}

/// What the storage client returns for a [`Command`](crate::input::Command).
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// `GetItem`
    Get(GetItemOutput),
    /// `PutItem`
    Put(PutItemOutput),
    /// `Query`
    Query(QueryOutput),
    /// `UpdateItem`
    Update(UpdateItemOutput),
}

impl CommandOutput {
    /// The operation that produced this output.
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::Get(_) => Operation::GetItem,
            Self::Put(_) => Operation::PutItem,
            Self::Query(_) => Operation::Query,
            Self::Update(_) => Operation::UpdateItem,
        }
    }
}
