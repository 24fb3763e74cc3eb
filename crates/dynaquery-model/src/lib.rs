//! Wire types for dynaquery.
//!
//! These mirror the DynamoDB JSON protocol (`awsJson1_0`) for the four item
//! operations the expression layer assembles: `GetItem`, `PutItem`, `Query`
//! and `UpdateItem`. Everything here is plain data with serde derives; the
//! expression-building logic lives in `dynaquery-core`.
// "DynamoDB" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod error;
pub mod input;
pub mod operations;
pub mod output;

pub use attribute_value::{AttributeValue, Item, TypeTag};
pub use error::{ErrorCode, ErrorResponse, FieldViolation};
pub use operations::{Operation, ReturnValue};
