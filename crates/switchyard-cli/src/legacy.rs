//! The legacy MCP SSE transport: requests are POSTed to the endpoint the
//! server announces, responses arrive as `message` events on the stream.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use reqwest_eventsource::{Event, EventSource};
use serde_json::Value;
use tokio_stream::StreamExt;

use switchyard_mcp::codec::{self, CONTENT_TYPE_JSON};
use switchyard_mcp::JsonRpcResponse;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Open a session, send one request and wait for its response.
pub async fn request(
    http: &Client,
    base_url: &str,
    method: &str,
    params: Value,
) -> anyhow::Result<Value> {
    let sse_url = format!("{base_url}/sse");
    tracing::debug!("Connecting to SSE: {sse_url}");

    let mut es = EventSource::get(&sse_url);
    let outcome =
        tokio::time::timeout(RESPONSE_TIMEOUT, exchange(http, base_url, &mut es, method, params))
            .await;
    es.close();

    outcome.map_err(|_| {
        anyhow!(
            "no response on {sse_url} within {}s",
            RESPONSE_TIMEOUT.as_secs()
        )
    })?
}

async fn exchange(
    http: &Client,
    base_url: &str,
    es: &mut EventSource,
    method: &str,
    params: Value,
) -> anyhow::Result<Value> {
    let encoded = codec::encode_request(method, params)?;
    let mut pending = Some(encoded.body);

    while let Some(event) = es.next().await {
        match event {
            Ok(Event::Open) => {
                tracing::debug!("SSE connection established");
            }
            Ok(Event::Message(msg)) if msg.event == "endpoint" => {
                let Some(body) = pending.take() else {
                    continue;
                };
                let url = endpoint_url(base_url, &msg.data)?;
                tracing::debug!(%url, method, "posting request");

                let resp = http
                    .post(url)
                    .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
                    .body(body)
                    .send()
                    .await
                    .context("failed to post to session endpoint")?;
                if resp.status() != StatusCode::ACCEPTED {
                    let status = resp.status();
                    bail!("session endpoint returned {status}: {}", resp.text().await?);
                }
            }
            Ok(Event::Message(msg)) => {
                let response: JsonRpcResponse = match serde_json::from_str(&msg.data) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Failed to parse message: {e}");
                        continue;
                    }
                };
                if response.id != encoded.id {
                    continue;
                }
                return Ok(codec::into_result(response, &encoded.id)?);
            }
            Err(err) => bail!("SSE error: {err}"),
        }
    }

    bail!("SSE stream ended before a response arrived")
}

/// Resolve the endpoint the server announced against the gateway URL.
fn endpoint_url(base_url: &str, endpoint: &str) -> anyhow::Result<Url> {
    let base = Url::parse(&format!("{base_url}/"))
        .with_context(|| format!("invalid gateway URL {base_url}"))?;
    base.join(endpoint)
        .with_context(|| format!("invalid endpoint {endpoint}"))
}
