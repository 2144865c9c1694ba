use anyhow::{bail, Context};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use switchyard_mcp::codec::{self, ACCEPT_BOTH, CONTENT_TYPE_JSON};
use switchyard_mcp::normalize::{normalize, ProviderResponse};
use switchyard_mcp::protocol::METHOD_TOOLS_CALL;

use crate::legacy;

/// How the CLI talks to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    StreamableHttp,
    LegacySse,
}

/// A handle on one gateway. Every call is a single JSON-RPC round trip.
pub struct GatewayClient {
    http: Client,
    base_url: String,
    transport: Transport,
}

impl GatewayClient {
    pub fn new(base_url: &str, transport: Transport) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    /// Call one of the gateway's own tools and return its structured output.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> anyhow::Result<Value> {
        let params = json!({ "name": name, "arguments": arguments });
        let result = match self.transport {
            Transport::StreamableHttp => self.request(METHOD_TOOLS_CALL, params).await?,
            Transport::LegacySse => {
                legacy::request(&self.http, &self.base_url, METHOD_TOOLS_CALL, params).await?
            }
        };
        tool_output(result)
    }

    async fn request(&self, method: &str, params: Value) -> anyhow::Result<Value> {
        let encoded = codec::encode_request(method, params)?;
        let url = format!("{}/mcp", self.base_url);
        tracing::debug!(%url, method, id = %encoded.id, "sending request");

        let resp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(ACCEPT, ACCEPT_BOTH)
            .body(encoded.body)
            .send()
            .await
            .with_context(|| format!("failed to reach gateway at {url}"))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = resp.text().await?;

        // Protocol errors come back as 400 with a JSON-RPC body.
        if !status.is_success() && status != StatusCode::BAD_REQUEST {
            bail!("gateway returned {status}: {body}");
        }
        Ok(codec::decode_response(&content_type, &body, &encoded.id)?)
    }
}

/// Pull the value out of a `tools/call` result: `structuredContent` when the
/// gateway provides it, the normalized content otherwise.
pub fn tool_output(result: Value) -> anyhow::Result<Value> {
    if result.get("isError").and_then(Value::as_bool) == Some(true) {
        let response = ProviderResponse::from_value(result);
        bail!(
            "tool failed: {}",
            response.first_text().unwrap_or("no details")
        );
    }
    if let Some(structured) = result.get("structuredContent") {
        return Ok(structured.clone());
    }
    Ok(normalize(ProviderResponse::from_value(result)))
}
