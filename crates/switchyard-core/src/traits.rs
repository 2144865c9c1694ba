use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::Error;
use crate::types::NodeDescriptor;

/// An open connection to one downstream node, private to one logical call.
///
/// Implementations must release their resources when dropped, so that a
/// cancelled call does not leak a process or a remote session.
#[async_trait]
pub trait NodeSession: Send {
    /// Send a JSON-RPC request and return its `result`.
    async fn request(&mut self, method: &str, params: Value) -> Result<Value, Error>;

    /// Send a JSON-RPC notification. No response is awaited.
    async fn notify(&mut self, method: &str, params: Value) -> Result<(), Error>;

    /// Tear the connection down. Calling it twice is a no-op.
    async fn close(&mut self);
}

/// Opens sessions to nodes according to their connection kind.
#[async_trait]
pub trait NodeConnector: Send + Sync {
    /// Open a ready-to-use session to `node`.
    async fn connect(&self, node: &NodeDescriptor) -> Result<Box<dyn NodeSession>, Error>;
}

/// Run `body` against a fresh session to `node`, closing it on every exit path.
///
/// The session is closed explicitly after `body` finishes, whether it
/// succeeded or not. If the returned future is dropped before that point the
/// boxed session is dropped with it, which tears the connection down.
///
/// # Errors
///
/// Returns the connector's error if the session cannot be opened, otherwise
/// whatever `body` returns.
pub async fn with_node_connection<T, F>(
    connector: &dyn NodeConnector,
    node: &NodeDescriptor,
    body: F,
) -> Result<T, Error>
where
    F: for<'s> FnOnce(&'s mut dyn NodeSession) -> BoxFuture<'s, Result<T, Error>>,
{
    let mut session = connector.connect(node).await?;
    tracing::debug!(node = %node.id, "opened node session");

    let outcome = body(session.as_mut()).await;

    session.close().await;
    tracing::debug!(node = %node.id, ok = outcome.is_ok(), "closed node session");
    outcome
}
