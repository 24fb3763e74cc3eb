//! The storage client seam.

use std::future::Future;
use std::pin::Pin;

use dynaquery_model::input::Command;
use dynaquery_model::output::CommandOutput;

/// Future returned by [`StorageClient::execute`].
pub type CommandFuture = Pin<Box<dyn Future<Output = anyhow::Result<CommandOutput>> + Send>>;

/// Executes assembled commands against a key-value store.
///
/// The host process builds one client and shares it through an `Arc`. The
/// client owns connection handling, retries and credentials; every error it
/// returns is surfaced to the caller as a storage engine error.
pub trait StorageClient: Send + Sync + 'static {
    /// Run one command and return the matching output variant.
    fn execute(&self, command: Command) -> CommandFuture;
}
