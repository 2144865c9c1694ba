use serde_json::Value;

use crate::types::NodeId;

/// Core error type for the switchyard gateway.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("transport error{}: {body}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Transport { status: Option<u16>, body: String },

    #[error("unsupported transport: {0:?}")]
    UnsupportedTransport(String),

    #[error("event stream carried no data frame")]
    EmptyStream,

    #[error("response id {actual} does not match request id {expected}")]
    CorrelationMismatch { expected: Value, actual: Value },

    #[error("remote error {code}: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("failed to spawn '{command}': {reason}")]
    Spawn { command: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable tag for the error, surfaced to callers in JSON-RPC `error.data`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownNode(_) => "unknown_node",
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::Transport { .. } => "transport_error",
            Self::UnsupportedTransport(_) => "unsupported_transport",
            Self::EmptyStream => "empty_stream",
            Self::CorrelationMismatch { .. } => "correlation_mismatch",
            Self::Remote { .. } => "remote_error",
            Self::MalformedResponse(_) => "malformed_response",
            Self::ToolFailed { .. } => "tool_failed",
            Self::Spawn { .. } => "spawn_error",
            Self::Config(_) => "config_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Shorthand for a transport failure that never produced an HTTP status.
    pub fn transport(body: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            body: body.into(),
        }
    }
}
