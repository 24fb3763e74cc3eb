//! Assembly of finished storage commands.
//!
//! Each function combines a resolved request with the expression builders and
//! returns an immutable [`Command`]. Nothing here performs I/O.

use dynaquery_model::input::{Command, GetItemInput, PutItemInput, QueryInput, UpdateItemInput};
use dynaquery_model::operations::ReturnValue;
use dynaquery_model::Item;
use tracing::debug;

use crate::codec::parse_typed_value;
use crate::error::{ExpressionResult, ValidationError};
use crate::key_condition::{KeyAttribute, KeyConditionInput, build_key_condition};
use crate::pagination::decode_cursor;
use crate::request::{QueryRequest, params};
use crate::resolver::{ExpressionAttributes, split_projection};
use crate::update::{UpdateSpec, build_update};

/// A caller-written expression (filter or condition) with its placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    /// The expression text.
    pub expression: String,
    /// Names and values it references.
    pub attributes: ExpressionAttributes,
}

impl Condition {
    /// Pair an expression with its placeholders.
    #[must_use]
    pub fn new(expression: impl Into<String>, attributes: ExpressionAttributes) -> Self {
        Self {
            expression: expression.into(),
            attributes,
        }
    }

    fn is_blank(&self) -> bool {
        self.expression.trim().is_empty()
    }
}

/// Optional parts of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Filter applied after the key condition.
    pub filter: Option<Condition>,
    /// Attributes to return; empty returns everything.
    pub projection: Vec<String>,
}

impl QueryOptions {
    /// Set the projection from a comma-separated list.
    #[must_use]
    pub fn with_projection(mut self, projection: &str) -> Self {
        self.projection = split_projection(projection).map(str::to_owned).collect();
        self
    }
}

/// Optional parts of a single-item read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOptions {
    /// Attributes to return; empty returns everything.
    pub projection: Vec<String>,
    /// Request a strongly consistent read.
    pub consistent_read: Option<bool>,
}

impl ReadOptions {
    /// Set the projection from a comma-separated list.
    #[must_use]
    pub fn with_projection(mut self, projection: &str) -> Self {
        self.projection = split_projection(projection).map(str::to_owned).collect();
        self
    }
}

/// Optional parts of a write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOptions {
    /// Condition the write must satisfy.
    pub condition: Option<Condition>,
    /// What the write returns; each operation has its own default.
    pub return_values: Option<ReturnValue>,
}

impl WriteOptions {
    /// Set the return values from a client spelling such as `all_new` or
    /// `UPDATED_OLD`. A blank value keeps the operation's default.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] on `returnValues` for an unknown value.
    pub fn with_return_values(mut self, raw: &str) -> Result<Self, ValidationError> {
        if raw.trim().is_empty() {
            self.return_values = None;
            return Ok(self);
        }
        let parsed = ReturnValue::parse(raw).ok_or_else(|| {
            ValidationError::single(
                "returnValues",
                "must be one of NONE, ALL_OLD, UPDATED_OLD, ALL_NEW, UPDATED_NEW",
            )
        })?;
        self.return_values = Some(parsed);
        Ok(self)
    }

    fn split(&self) -> (Option<String>, ExpressionAttributes) {
        match self.condition.as_ref().filter(|c| !c.is_blank()) {
            Some(c) => (Some(c.expression.clone()), c.attributes.clone()),
            None => (None, ExpressionAttributes::new()),
        }
    }
}

/// Assemble a `Query` command from a validated request.
///
/// # Errors
///
/// Fails if a key value does not parse under its type tag, the comparator is
/// unusable, the cursor is malformed or a partition key field is missing.
pub fn assemble_query(
    table_name: &str,
    request: &QueryRequest,
    options: &QueryOptions,
) -> ExpressionResult<Command> {
    let partition = KeyAttribute::new(
        required(request.pk_property.as_deref(), params::PK_PROPERTY)?,
        parse_typed_value(
            required(request.pk_value.as_deref(), params::PK_VALUE)?,
            required(request.pk_type.as_deref(), params::PK_TYPE)?,
        )?,
    );

    let sort = match (
        request.sk_property.as_deref(),
        request.sk_value.as_deref(),
        request.sk_type.as_deref(),
    ) {
        (Some(property), Some(value), Some(tag)) => Some(KeyAttribute::new(
            property,
            parse_typed_value(value, tag)?,
        )),
        _ => None,
    };
    let sort_value2 = match request.sk_value2.as_deref() {
        Some(value) => {
            let tag = required(request.sk_value2_type_or_default(), params::SK_VALUE2_TYPE)?;
            Some(parse_typed_value(value, tag)?)
        }
        None => None,
    };

    let key_condition = build_key_condition(&KeyConditionInput {
        partition,
        sort,
        sort_value2,
        comparator: request.sk_comparator.clone(),
    })?;

    let filter = options.filter.as_ref().filter(|f| !f.is_blank());
    let (filter_expression, mut attributes) = match filter {
        Some(filter) => (
            Some(filter.expression.clone()),
            key_condition.attributes.merge(&filter.attributes),
        ),
        None => (None, key_condition.attributes),
    };
    let projection_expression =
        attributes.alias_projection(options.projection.iter().map(String::as_str));
    let exclusive_start_key =
        decode_cursor(request.last_evaluated_key.as_deref())?.unwrap_or_default();
    let (names, values) = attributes.into_parts();

    debug!(
        table = table_name,
        index = ?request.index_name,
        expression = %key_condition.expression,
        names = names.len(),
        values = values.len(),
        "assembled query"
    );

    Ok(Command::Query(QueryInput {
        table_name: table_name.to_owned(),
        index_name: request.index_name.clone(),
        key_condition_expression: key_condition.expression,
        filter_expression,
        projection_expression,
        expression_attribute_names: names,
        expression_attribute_values: values,
        scan_index_forward: request.sorting.map(|s| s.scan_index_forward()),
        limit: request.limit.map(|l| i32::try_from(l).unwrap_or(i32::MAX)),
        exclusive_start_key,
    }))
}

/// Assemble a `GetItem` command.
#[must_use]
pub fn assemble_get(table_name: &str, key: Item, options: &ReadOptions) -> Command {
    let mut attributes = ExpressionAttributes::new();
    let projection_expression =
        attributes.alias_projection(options.projection.iter().map(String::as_str));
    let (names, _) = attributes.into_parts();

    Command::Get(GetItemInput {
        table_name: table_name.to_owned(),
        key,
        consistent_read: options.consistent_read,
        projection_expression,
        expression_attribute_names: names,
    })
}

/// Assemble a `PutItem` command. Returns nothing unless asked otherwise.
#[must_use]
pub fn assemble_put(table_name: &str, item: Item, options: &WriteOptions) -> Command {
    let (condition_expression, attributes) = options.split();
    let (names, values) = attributes.into_parts();

    Command::Put(PutItemInput {
        table_name: table_name.to_owned(),
        item,
        condition_expression,
        expression_attribute_names: names,
        expression_attribute_values: values,
        return_values: Some(options.return_values.unwrap_or(ReturnValue::None)),
    })
}

/// Assemble an `UpdateItem` command. Returns the new item unless asked
/// otherwise.
///
/// # Errors
///
/// Returns [`crate::ExpressionError::EmptyUpdate`] when there is nothing to
/// set.
pub fn assemble_update(
    table_name: &str,
    key: Item,
    update: &UpdateSpec,
    options: &WriteOptions,
) -> ExpressionResult<Command> {
    let (condition_expression, extras) = options.split();
    let clause = build_update(update, &extras)?;
    let (names, values) = clause.attributes.into_parts();

    Ok(Command::Update(UpdateItemInput {
        table_name: table_name.to_owned(),
        key,
        update_expression: clause.expression,
        condition_expression,
        expression_attribute_names: names,
        expression_attribute_values: values,
        return_values: Some(options.return_values.unwrap_or(ReturnValue::AllNew)),
    }))
}

fn required<'a>(value: Option<&'a str>, path: &str) -> Result<&'a str, ValidationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ValidationError::single(path, "is required"))
}

#[cfg(test)]
mod tests {
    use dynaquery_model::AttributeValue;
    use serde_json::json;

    use super::*;
    use crate::error::ExpressionError;
    use crate::request::SortDirection;

    fn orders_request() -> QueryRequest {
        QueryRequest::for_partition("tenantId", &AttributeValue::S("t1".to_owned()))
    }

    fn query_input(command: Command) -> QueryInput {
        match command {
            Command::Query(input) => input,
            other => panic!("expected query, got {other:?}"),
        }
    }

    fn user_key() -> Item {
        let mut key = Item::new();
        key.insert("userId".to_owned(), AttributeValue::S("u1".to_owned()));
        key
    }

    #[test]
    fn test_should_assemble_partition_only_query() {
        let command =
            assemble_query("orders", &orders_request(), &QueryOptions::default()).unwrap();
        let json = serde_json::to_value(&command).unwrap();

        assert_eq!(
            json,
            json!({
                "TableName": "orders",
                "KeyConditionExpression": "#pk = :pk",
                "ExpressionAttributeNames": { "#pk": "tenantId" },
                "ExpressionAttributeValues": { ":pk": { "S": "t1" } }
            })
        );
    }

    #[test]
    fn test_should_assemble_full_query() {
        let request = QueryRequest {
            sk_value: Some("100".to_owned()),
            sk_type: Some("N".to_owned()),
            sk_property: Some("createdAt".to_owned()),
            sk_value2: Some("200".to_owned()),
            sk_comparator: Some("between".to_owned()),
            limit: Some(25),
            sorting: Some(SortDirection::Desc),
            last_evaluated_key: Some(
                r#"{"tenantId":{"S":"t1"},"createdAt":{"N":"150"}}"#.to_owned(),
            ),
            ..orders_request().with_index("byCreatedAt")
        };
        let mut filter_attributes = ExpressionAttributes::new();
        filter_attributes.insert_name("#state", "state");
        filter_attributes.insert_value(":open", AttributeValue::S("OPEN".to_owned()));
        let options = QueryOptions {
            filter: Some(Condition::new("#state = :open", filter_attributes)),
            projection: vec!["id".to_owned(), "status".to_owned()],
        };

        let input = query_input(assemble_query("orders", &request, &options).unwrap());
        assert_eq!(input.index_name.as_deref(), Some("byCreatedAt"));
        assert_eq!(
            input.key_condition_expression,
            "#pk = :pk AND #sk BETWEEN :sk AND :skValue2"
        );
        assert_eq!(input.filter_expression.as_deref(), Some("#state = :open"));
        assert_eq!(input.projection_expression.as_deref(), Some("id, #status"));
        assert_eq!(input.expression_attribute_names.len(), 4);
        assert_eq!(
            input.expression_attribute_values[":skValue2"],
            AttributeValue::N("200".to_owned())
        );
        assert_eq!(input.scan_index_forward, Some(false));
        assert_eq!(input.limit, Some(25));
        assert_eq!(
            input.exclusive_start_key["createdAt"],
            AttributeValue::N("150".to_owned())
        );
    }

    #[test]
    fn test_should_use_own_type_for_second_sort_value() {
        let request = QueryRequest {
            sk_value: Some("a".to_owned()),
            sk_type: Some("S".to_owned()),
            sk_property: Some("code".to_owned()),
            sk_value2: Some("9".to_owned()),
            sk_value2_type: Some("N".to_owned()),
            sk_comparator: Some("between".to_owned()),
            ..orders_request()
        };
        let command = assemble_query("orders", &request, &QueryOptions::default()).unwrap();
        let input = query_input(command);
        assert_eq!(
            input.expression_attribute_values[":skValue2"],
            AttributeValue::N("9".to_owned())
        );
    }

    #[test]
    fn test_should_keep_filter_alias_when_projecting_same_word() {
        let mut filter_attributes = ExpressionAttributes::new();
        filter_attributes.insert_name("#status", "orderStatus");
        filter_attributes.insert_value(":open", AttributeValue::S("OPEN".to_owned()));
        let options = QueryOptions {
            filter: Some(Condition::new("#status = :open", filter_attributes)),
            projection: vec!["status".to_owned()],
        };

        let input = query_input(assemble_query("orders", &orders_request(), &options).unwrap());
        assert_eq!(input.filter_expression.as_deref(), Some("#status = :open"));
        assert_eq!(input.expression_attribute_names["#status"], "orderStatus");
        assert_eq!(input.projection_expression.as_deref(), Some("#status_1"));
        assert_eq!(input.expression_attribute_names["#status_1"], "status");
    }

    #[test]
    fn test_should_propagate_builder_errors() {
        let bad_number = QueryRequest {
            pk_type: Some("N".to_owned()),
            ..orders_request()
        };
        assert!(matches!(
            assemble_query("orders", &bad_number, &QueryOptions::default()),
            Err(ExpressionError::UnsupportedType { .. })
        ));

        let bad_cursor = QueryRequest {
            last_evaluated_key: Some("{oops".to_owned()),
            ..orders_request()
        };
        assert!(matches!(
            assemble_query("orders", &bad_cursor, &QueryOptions::default()),
            Err(ExpressionError::Cursor { .. })
        ));

        let missing_pk = QueryRequest::default();
        let err = assemble_query("orders", &missing_pk, &QueryOptions::default()).unwrap_err();
        assert!(matches!(err, ExpressionError::Validation(_)));
    }

    #[test]
    fn test_should_assemble_get_without_empty_maps() {
        let command = assemble_get("users", user_key(), &ReadOptions::default());
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(
            json,
            json!({ "TableName": "users", "Key": { "userId": { "S": "u1" } } })
        );
    }

    #[test]
    fn test_should_alias_get_projection() {
        let options = ReadOptions {
            projection: vec!["name".to_owned(), "email".to_owned()],
            consistent_read: Some(true),
        };
        let Command::Get(input) = assemble_get("users", user_key(), &options) else {
            panic!("expected get");
        };
        assert_eq!(input.projection_expression.as_deref(), Some("#name, email"));
        assert_eq!(input.expression_attribute_names["#name"], "name");
        assert_eq!(input.consistent_read, Some(true));
    }

    #[test]
    fn test_should_accept_comma_separated_projection() {
        let options = QueryOptions::default().with_projection("id, size ,, name");
        let input = query_input(assemble_query("orders", &orders_request(), &options).unwrap());
        assert_eq!(input.projection_expression.as_deref(), Some("id, #size, #name"));
        assert_eq!(input.expression_attribute_names["#size"], "size");
    }

    #[test]
    fn test_should_default_put_to_return_nothing() {
        let command = assemble_put("users", user_key(), &WriteOptions::default());
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["ReturnValues"], "NONE");
        assert!(json.get("ConditionExpression").is_none());
        assert!(json.get("ExpressionAttributeValues").is_none());
    }

    #[test]
    fn test_should_carry_put_condition() {
        let mut attributes = ExpressionAttributes::new();
        attributes.insert_name("#id", "userId");
        let options = WriteOptions {
            condition: Some(Condition::new("attribute_not_exists(#id)", attributes)),
            return_values: Some(ReturnValue::AllOld),
        };
        let Command::Put(input) = assemble_put("users", user_key(), &options) else {
            panic!("expected put");
        };
        assert_eq!(
            input.condition_expression.as_deref(),
            Some("attribute_not_exists(#id)")
        );
        assert_eq!(input.expression_attribute_names["#id"], "userId");
        assert_eq!(input.return_values, Some(ReturnValue::AllOld));
    }

    #[test]
    fn test_should_assemble_update_with_condition() {
        let mut attributes = ExpressionAttributes::new();
        attributes.insert_value(":email", AttributeValue::S("old@x.io".to_owned()));
        let options = WriteOptions {
            condition: Some(Condition::new("email = :email", attributes)),
            return_values: None,
        };
        let update = UpdateSpec::entity([("email", AttributeValue::S("new@x.io".to_owned()))]);

        let Command::Update(input) =
            assemble_update("users", user_key(), &update, &options).unwrap()
        else {
            panic!("expected update");
        };
        assert_eq!(input.update_expression, "SET email = :email_update_1");
        assert_eq!(input.condition_expression.as_deref(), Some("email = :email"));
        assert_eq!(input.expression_attribute_values.len(), 2);
        assert_eq!(input.return_values, Some(ReturnValue::AllNew));
        let json = serde_json::to_value(Command::Update(input)).unwrap();
        assert!(json.get("ExpressionAttributeNames").is_none());
    }

    #[test]
    fn test_should_parse_client_return_values() {
        let options = WriteOptions::default().with_return_values("updated_old").unwrap();
        let Command::Update(input) = assemble_update(
            "users",
            user_key(),
            &UpdateSpec::entity([("email", AttributeValue::S("a@b.c".to_owned()))]),
            &options,
        )
        .unwrap() else {
            panic!("expected update");
        };
        assert_eq!(input.return_values, Some(ReturnValue::UpdatedOld));

        let blank = WriteOptions::default().with_return_values("  ").unwrap();
        assert_eq!(blank.return_values, None);

        let err = WriteOptions::default().with_return_values("everything").unwrap_err();
        assert_eq!(err.paths().collect::<Vec<_>>(), vec!["returnValues"]);
    }

    #[test]
    fn test_should_reject_empty_update() {
        let err = assemble_update(
            "users",
            user_key(),
            &UpdateSpec::Entity(Vec::new()),
            &WriteOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExpressionError::EmptyUpdate));
    }
}
