use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use switchyard_core::{
    with_node_connection, Error, NodeConnector, NodeList, NodeRegistry, NodeTools,
    RejectedCall, ToolCallOutcome, ToolCallResult,
};
use switchyard_mcp::normalize::{normalize, normalize_tools, ProviderResponse};
use switchyard_mcp::protocol::{ToolsCallParams, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST};

/// The three gateway operations, routed over a fresh node session per call.
pub struct Gateway {
    registry: Arc<NodeRegistry>,
    connector: Arc<dyn NodeConnector>,
}

impl Gateway {
    pub fn new(registry: Arc<NodeRegistry>, connector: Arc<dyn NodeConnector>) -> Self {
        Self {
            registry,
            connector,
        }
    }

    /// Summaries of every configured node, in configuration order. Never
    /// contacts a node.
    #[must_use]
    pub fn list_nodes(&self) -> NodeList {
        NodeList {
            nodes: self
                .registry
                .list_nodes()
                .iter()
                .map(|node| node.summary())
                .collect(),
        }
    }

    /// # Errors
    ///
    /// [`Error::UnknownNode`] before any connection is attempted, otherwise
    /// whatever the node session or descriptor normalization reports.
    pub async fn list_node_tools(&self, node_id: &str) -> Result<NodeTools, Error> {
        let node = self.registry.resolve(node_id)?;

        let outcome = with_node_connection(self.connector.as_ref(), node, |session| {
            Box::pin(async move {
                let raw = session.request(METHOD_TOOLS_LIST, Value::Object(Map::new())).await?;
                normalize_tools(raw)
            })
        })
        .await;

        match outcome {
            Ok(tools) => {
                info!(node = %node.id, count = tools.len(), "listed node tools");
                Ok(NodeTools {
                    node: node.id.clone(),
                    tools,
                })
            }
            Err(e) => {
                warn!(node = %node.id, error = %e, "list_node_tools failed");
                Err(e)
            }
        }
    }

    /// Call `tool_name` on `node_id`.
    ///
    /// Non-object `arguments` are rejected locally and returned as a
    /// [`ToolCallOutcome::Rejected`] envelope; `None` and `null` mean `{}`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownNode`], any session failure, or [`Error::ToolFailed`]
    /// when the node flags its result with `isError`.
    pub async fn call_node_tool(
        &self,
        node_id: &str,
        tool_name: &str,
        arguments: Option<Value>,
    ) -> Result<ToolCallOutcome, Error> {
        let arguments = match validate_arguments(arguments) {
            Ok(arguments) => arguments,
            Err(Error::InvalidArguments(reason)) => {
                warn!(node = node_id, tool = tool_name, reason = %reason, "rejected tool arguments");
                return Ok(ToolCallOutcome::Rejected(RejectedCall::invalid_arguments(
                    reason,
                )));
            }
            Err(e) => return Err(e),
        };

        let node = self.registry.resolve(node_id)?;
        let params = serde_json::to_value(ToolsCallParams {
            name: tool_name.to_string(),
            arguments,
        })
        .map_err(|e| Error::Internal(e.to_string()))?;
        let tool = tool_name.to_string();

        let outcome = with_node_connection(self.connector.as_ref(), node, |session| {
            Box::pin(async move {
                let raw = session.request(METHOD_TOOLS_CALL, params).await?;
                let response = ProviderResponse::from_value(raw);
                if response.is_error() {
                    let message = response
                        .first_text()
                        .unwrap_or("tool reported an error")
                        .to_string();
                    return Err(Error::ToolFailed { tool, message });
                }
                Ok(normalize(response))
            })
        })
        .await;

        match outcome {
            Ok(result) => {
                info!(node = %node.id, tool = tool_name, "tool call completed");
                Ok(ToolCallOutcome::Completed(ToolCallResult {
                    node: node.id.clone(),
                    tool_name: tool_name.to_string(),
                    result,
                }))
            }
            Err(e) => {
                warn!(node = %node.id, tool = tool_name, error = %e, "tool call failed");
                Err(e)
            }
        }
    }
}

fn validate_arguments(arguments: Option<Value>) -> Result<Value, Error> {
    match arguments {
        None | Some(Value::Null) => Ok(Value::Object(Map::new())),
        Some(value @ Value::Object(_)) => Ok(value),
        Some(_) => Err(Error::InvalidArguments(
            "arguments must be an object".to_string(),
        )),
    }
}
