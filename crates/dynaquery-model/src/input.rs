//! Command inputs for the four item operations.
//!
//! All input structs use `PascalCase` JSON field naming to match the wire
//! protocol. Optional fields are omitted when `None`; empty maps are omitted
//! so an assembled command never carries `ExpressionAttributeNames: {}`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attribute_value::{AttributeValue, Item};
use crate::operations::{Operation, ReturnValue};

/// Read one item by its full primary key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemInput {
    /// Target table.
    pub table_name: String,

    /// Primary key of the item to retrieve.
    pub key: Item,

    /// Strongly consistent read when `Some(true)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,

    /// Attributes to retrieve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,

    /// `#alias -> attribute name` for every expression of the command.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,
}

/// Write a whole item, replacing any existing one with the same key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemInput {
    /// Target table.
    pub table_name: String,

    /// The full item, keys included.
    pub item: Item,

    /// A condition that must hold for the put to succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,

    /// `#alias -> attribute name` for every expression of the command.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,

    /// `:placeholder -> value` for every expression of the command.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: HashMap<String, AttributeValue>,

    /// Attributes to return after the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_values: Option<ReturnValue>,
}

/// Read items from one partition, optionally narrowed by sort key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryInput {
    /// Target table.
    pub table_name: String,

    /// Secondary index to read instead of the base table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    /// The condition on the partition key and, optionally, the sort key.
    pub key_condition_expression: String,

    /// Conditions applied to items after the key condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,

    /// Attributes to retrieve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,

    /// `#alias -> attribute name` for every expression of the command.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,

    /// `:placeholder -> value` for every expression of the command.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: HashMap<String, AttributeValue>,

    /// `true` for ascending sort-key order, `false` for descending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_index_forward: Option<bool>,

    /// Maximum number of items to evaluate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,

    /// Primary key of the item to resume after.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub exclusive_start_key: Item,
}

/// Change selected attributes of one item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemInput {
    /// Target table.
    pub table_name: String,

    /// Primary key of the item to update.
    pub key: Item,

    /// The `SET` clause (or any caller-supplied update expression).
    pub update_expression: String,

    /// A condition that must hold for the update to succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,

    /// `#alias -> attribute name` for every expression of the command.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,

    /// `:placeholder -> value` for every expression of the command.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: HashMap<String, AttributeValue>,

    /// Attributes to return after the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_values: Option<ReturnValue>,
}

/// A fully assembled command, ready for the storage client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Command {
    /// `GetItem`
    Get(GetItemInput),
    /// `PutItem`
    Put(PutItemInput),
    /// `Query`
    Query(QueryInput),
    /// `UpdateItem`
    Update(UpdateItemInput),
}

impl Command {
    /// The operation this command targets.
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::Get(_) => Operation::GetItem,
            Self::Put(_) => Operation::PutItem,
            Self::Query(_) => Operation::Query,
            Self::Update(_) => Operation::UpdateItem,
        }
    }

    /// The table this command targets.
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::Get(i) => &i.table_name,
            Self::Put(i) => &i.table_name,
            Self::Query(i) => &i.table_name,
            Self::Update(i) => &i.table_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_omit_empty_maps_and_none_fields() {
        let input = QueryInput {
            table_name: "orders".to_owned(),
            key_condition_expression: "#pk = :pk".to_owned(),
            ..Default::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(!obj.contains_key("ExpressionAttributeNames"));
        assert!(!obj.contains_key("ExclusiveStartKey"));
        assert!(!obj.contains_key("ScanIndexForward"));
    }

    #[test]
    fn test_should_serialize_command_as_bare_input() {
        let mut key = Item::new();
        key.insert("id".to_owned(), AttributeValue::S("1".to_owned()));
        let command = Command::Update(UpdateItemInput {
            table_name: "users".to_owned(),
            key,
            update_expression: "SET a = :a".to_owned(),
            return_values: Some(ReturnValue::AllNew),
            ..Default::default()
        });
        assert_eq!(command.operation(), Operation::UpdateItem);
        assert_eq!(command.table_name(), "users");

        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["TableName"], "users");
        assert_eq!(json["Key"]["id"]["S"], "1");
        assert_eq!(json["ReturnValues"], "ALL_NEW");
    }
}
