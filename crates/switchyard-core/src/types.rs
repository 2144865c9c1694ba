use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identifier of a downstream node, as written in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// How the gateway reaches a node. Serialized as the `type` of a node listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    #[serde(rename = "url")]
    RemoteUrl,
    #[serde(rename = "command")]
    LocalCommand,
}

/// Connection target of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTarget {
    /// MCP over HTTP POST at `url`, with extra request headers.
    RemoteUrl {
        url: String,
        headers: BTreeMap<String, String>,
    },
    /// MCP over the standard streams of a spawned process.
    LocalCommand {
        command: String,
        args: Vec<String>,
        env: BTreeMap<String, String>,
    },
}

/// A configured downstream tool provider. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub id: NodeId,
    pub target: NodeTarget,
    pub description: String,
    pub tags: Vec<String>,
}

impl NodeDescriptor {
    #[must_use]
    pub fn kind(&self) -> ConnectionKind {
        match self.target {
            NodeTarget::RemoteUrl { .. } => ConnectionKind::RemoteUrl,
            NodeTarget::LocalCommand { .. } => ConnectionKind::LocalCommand,
        }
    }

    /// URL or command line, for logs and diagnostics.
    #[must_use]
    pub fn target_display(&self) -> String {
        match &self.target {
            NodeTarget::RemoteUrl { url, .. } => url.clone(),
            NodeTarget::LocalCommand { command, args, .. } => {
                std::iter::once(command.as_str())
                    .chain(args.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        }
    }

    #[must_use]
    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            id: self.id.clone(),
            kind: self.kind(),
            description: self.description.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// One entry of the `list_nodes` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    pub description: String,
    pub tags: Vec<String>,
}

/// Result of `list_nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeList {
    pub nodes: Vec<NodeSummary>,
}

/// A single named, schema-described operation a node exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    #[serde(rename = "outputSchema", default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

/// Result of `list_node_tools`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTools {
    pub node: NodeId,
    pub tools: Vec<ToolDescriptor>,
}

/// Successful result of `call_node_tool`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub node: NodeId,
    #[serde(rename = "toolName")]
    pub tool_name: String,
    pub result: Value,
}

/// Error payload returned as data when `call_node_tool` rejects its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCall {
    pub error: String,
    pub reason: String,
}

impl RejectedCall {
    #[must_use]
    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        Self {
            error: "invalid_arguments".to_string(),
            reason: reason.into(),
        }
    }
}

/// Either a completed call or a local rejection; both are successful envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolCallOutcome {
    Completed(ToolCallResult),
    Rejected(RejectedCall),
}
