use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use switchyard_core::{Error, NodeConnector, NodeDescriptor, NodeSession, NodeTarget};
use switchyard_mcp::protocol::{
    InitializeParams, InitializeResult, METHOD_INITIALIZE, METHOD_INITIALIZED,
};

use crate::http::HttpSession;
use crate::stdio::StdioSession;

/// Client name announced to nodes during `initialize`.
pub const CLIENT_NAME: &str = "switchyard";

/// Per-call timeout used when none is configured.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_millis(5000);

/// Opens a fresh, initialized session per call. Nothing is pooled.
#[derive(Clone)]
pub struct Connector {
    http: reqwest::Client,
    timeout: Duration,
}

impl Connector {
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, timeout })
    }

    fn open(&self, node: &NodeDescriptor) -> Result<Box<dyn NodeSession>, Error> {
        let session: Box<dyn NodeSession> = match &node.target {
            NodeTarget::RemoteUrl { url, headers } => {
                Box::new(HttpSession::new(self.http.clone(), url, headers)?)
            }
            NodeTarget::LocalCommand { command, args, env } => {
                Box::new(StdioSession::spawn(command, args, env, self.timeout)?)
            }
        };
        Ok(session)
    }
}

#[async_trait]
impl NodeConnector for Connector {
    async fn connect(&self, node: &NodeDescriptor) -> Result<Box<dyn NodeSession>, Error> {
        let mut session = self.open(node)?;
        match initialize(session.as_mut()).await {
            Ok(info) => {
                debug!(
                    node = %node.id,
                    target = %node.target_display(),
                    server = info.server_info.as_ref().map_or("", |s| s.name.as_str()),
                    protocol = %info.protocol_version,
                    "node session ready"
                );
                Ok(session)
            }
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }
}

/// Perform the MCP handshake: `initialize`, then `notifications/initialized`.
///
/// A failed `initialized` notification is logged and otherwise ignored.
///
/// # Errors
///
/// Returns the session's error if `initialize` fails.
pub async fn initialize(session: &mut dyn NodeSession) -> Result<InitializeResult, Error> {
    let params = serde_json::to_value(InitializeParams::new(
        CLIENT_NAME,
        env!("CARGO_PKG_VERSION"),
    ))
    .map_err(|e| Error::Internal(e.to_string()))?;

    let raw: Value = session.request(METHOD_INITIALIZE, params).await?;
    let info: InitializeResult = serde_json::from_value(raw).unwrap_or_default();

    if let Err(e) = session.notify(METHOD_INITIALIZED, json!({})).await {
        debug!(error = %e, "initialized notification failed");
    }
    Ok(info)
}
