//! Item operations over an injected storage client.
//!
//! Every call runs inside an `info` span carrying a fresh request id, the
//! operation and the table. Client failures are logged and returned as
//! [`ExpressionError::StorageEngine`]; nothing is retried.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::Arc;

use dynaquery_model::input::Command;
use dynaquery_model::output::CommandOutput;
use dynaquery_model::{Item, Operation};
use tracing::{Instrument, debug, error, info_span};
use uuid::Uuid;

use crate::assembler::{
    QueryOptions, ReadOptions, WriteOptions, assemble_get, assemble_put, assemble_query,
    assemble_update,
};
use crate::client::StorageClient;
use crate::config::ServiceConfig;
use crate::error::{ExpressionError, ExpressionResult};
use crate::pagination::encode_cursor;
use crate::request::QueryRequest;
use crate::update::UpdateSpec;
use crate::validation::RequestValidator;

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    /// Matching items.
    pub items: Vec<Item>,
    /// Number of items returned.
    pub count: i32,
    /// Number of items evaluated before filtering.
    pub scanned_count: i32,
    /// Cursor for the next page; `None` on the last page.
    pub next_cursor: Option<String>,
}

/// Get, put, query and update against one storage client.
#[derive(Debug)]
pub struct ItemService<C> {
    client: Arc<C>,
    config: ServiceConfig,
    validator: RequestValidator,
}

impl<C> Clone for ItemService<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: self.config.clone(),
            validator: self.validator,
        }
    }
}

impl<C: StorageClient> ItemService<C> {
    /// Create a service over a shared client.
    #[must_use]
    pub fn new(client: Arc<C>, config: ServiceConfig) -> Self {
        let validator = RequestValidator::new(config.limits);
        Self {
            client,
            config,
            validator,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Resolve raw parameters against `default`, then query one page.
    ///
    /// # Errors
    ///
    /// Any validation or expression error, or a storage engine failure.
    pub async fn query<S: BuildHasher>(
        &self,
        table_name: &str,
        raw: &HashMap<String, String, S>,
        default: &QueryRequest,
        options: &QueryOptions,
    ) -> ExpressionResult<QueryPage> {
        async {
            let request = self.validator.resolve(raw, default)?;
            let command = assemble_query(table_name, &request, options)?;
            match self.execute(command).await? {
                CommandOutput::Query(output) => {
                    let next_cursor = output
                        .last_evaluated_key
                        .filter(|k| !k.is_empty())
                        .map(|k| encode_cursor(&k));
                    debug!(
                        count = output.count,
                        has_more = next_cursor.is_some(),
                        "query page fetched"
                    );
                    Ok(QueryPage {
                        items: output.items,
                        count: output.count,
                        scanned_count: output.scanned_count,
                        next_cursor,
                    })
                }
                other => Err(unexpected(Operation::Query, &other)),
            }
        }
        .instrument(request_span(Operation::Query, table_name))
        .await
    }

    /// Fetch one item by key. Uses the configured consistency unless
    /// `options` says otherwise.
    ///
    /// # Errors
    ///
    /// A storage engine failure.
    pub async fn get_item(
        &self,
        table_name: &str,
        key: Item,
        options: &ReadOptions,
    ) -> ExpressionResult<Option<Item>> {
        async {
            let options = ReadOptions {
                consistent_read: options
                    .consistent_read
                    .or(self.config.consistent_read.then_some(true)),
                ..options.clone()
            };
            match self.execute(assemble_get(table_name, key, &options)).await? {
                CommandOutput::Get(output) => Ok(output.item),
                other => Err(unexpected(Operation::GetItem, &other)),
            }
        }
        .instrument(request_span(Operation::GetItem, table_name))
        .await
    }

    /// Write a full item, returning whatever `ReturnValues` selected.
    ///
    /// # Errors
    ///
    /// A storage engine failure, including a failed condition.
    pub async fn put_item(
        &self,
        table_name: &str,
        item: Item,
        options: &WriteOptions,
    ) -> ExpressionResult<Option<Item>> {
        async {
            match self.execute(assemble_put(table_name, item, options)).await? {
                CommandOutput::Put(output) => Ok(output.attributes),
                other => Err(unexpected(Operation::PutItem, &other)),
            }
        }
        .instrument(request_span(Operation::PutItem, table_name))
        .await
    }

    /// Update an item, returning whatever `ReturnValues` selected.
    ///
    /// # Errors
    ///
    /// [`ExpressionError::EmptyUpdate`] when there is nothing to set, or a
    /// storage engine failure.
    pub async fn update_item(
        &self,
        table_name: &str,
        key: Item,
        update: &UpdateSpec,
        options: &WriteOptions,
    ) -> ExpressionResult<Option<Item>> {
        async {
            let command = assemble_update(table_name, key, update, options)?;
            match self.execute(command).await? {
                CommandOutput::Update(output) => Ok(output.attributes),
                other => Err(unexpected(Operation::UpdateItem, &other)),
            }
        }
        .instrument(request_span(Operation::UpdateItem, table_name))
        .await
    }

    async fn execute(&self, command: Command) -> ExpressionResult<CommandOutput> {
        self.client.execute(command).await.map_err(|err| {
            error!(error = %format!("{err:#}"), "storage client failed");
            ExpressionError::StorageEngine(err)
        })
    }
}

fn request_span(operation: Operation, table_name: &str) -> tracing::Span {
    info_span!(
        "item_request",
        request_id = %Uuid::new_v4(),
        operation = %operation,
        write = operation.is_write(),
        table = table_name,
    )
}

fn unexpected(expected: Operation, output: &CommandOutput) -> ExpressionError {
    let err = anyhow::anyhow!(
        "storage client returned {} output for {expected}",
        output.operation()
    );
    error!(error = %err, "storage client returned mismatched output");
    ExpressionError::StorageEngine(err)
}
