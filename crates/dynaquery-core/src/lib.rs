//! Expression construction for key-value store item commands.
//!
//! Turns client-facing query and update descriptions into wire-exact
//! `GetItem`, `PutItem`, `Query` and `UpdateItem` commands: key-condition
//! expressions, `#name` / `:value` placeholder maps, reserved-word aliasing,
//! collision-safe `SET` clauses and opaque pagination cursors.
//!
//! Everything except [`service`] is synchronous and pure. The storage client
//! that actually performs the call is injected through [`client::StorageClient`].
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod assembler;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod key_condition;
pub mod pagination;
pub mod request;
pub mod reserved;
pub mod resolver;
pub mod service;
pub mod update;
pub mod validation;

pub use assembler::{Condition, QueryOptions, ReadOptions, WriteOptions};
pub use client::StorageClient;
pub use config::{QueryLimits, ServiceConfig};
pub use error::{ExpressionError, ExpressionResult, ValidationError};
pub use request::{QueryRequest, SortDirection};
pub use service::{ItemService, QueryPage};
pub use update::UpdateSpec;
pub use validation::RequestValidator;
