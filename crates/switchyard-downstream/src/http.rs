//! `remote-url` nodes: MCP streamable HTTP.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, trace};

use switchyard_core::{Error, NodeSession};
use switchyard_mcp::codec::{self, ACCEPT_BOTH, CONTENT_TYPE_JSON};
use switchyard_mcp::protocol::SESSION_HEADER;

/// One logical session with an HTTP node.
///
/// If the node assigns an `Mcp-Session-Id`, it is echoed on every later
/// request and released with a `DELETE` when the session closes or drops.
pub struct HttpSession {
    client: Client,
    url: String,
    headers: HeaderMap,
    session_id: Option<String>,
    closed: bool,
}

impl HttpSession {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a configured header is not a valid HTTP header.
    pub fn new(
        client: Client,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<Self, Error> {
        let mut header_map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::Config(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| Error::Config(format!("invalid value for header '{name}': {e}")))?;
            header_map.insert(name, value);
        }

        Ok(Self {
            client,
            url: url.to_string(),
            headers: header_map,
            session_id: None,
            closed: false,
        })
    }

    fn post(&self, body: Vec<u8>) -> RequestBuilder {
        let request = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(ACCEPT, ACCEPT_BOTH)
            .body(body);
        match &self.session_id {
            Some(id) => request.header(SESSION_HEADER, id),
            None => request,
        }
    }

    fn release(&self, session_id: &str) -> RequestBuilder {
        self.client
            .delete(&self.url)
            .headers(self.headers.clone())
            .header(SESSION_HEADER, session_id)
    }
}

fn transport_error(err: &reqwest::Error) -> Error {
    Error::Transport {
        status: err.status().map(|s| s.as_u16()),
        body: if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        },
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl NodeSession for HttpSession {
    async fn request(&mut self, method: &str, params: Value) -> Result<Value, Error> {
        let encoded = codec::encode_request(method, params)?;
        trace!(url = %self.url, method, id = %encoded.id, "gateway -> node");

        let response = self
            .post(encoded.body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if self.session_id.is_none() {
            if let Some(id) = header_str(response.headers(), SESSION_HEADER) {
                debug!(url = %self.url, session = id, "node assigned session");
                self.session_id = Some(id.to_string());
            }
        }
        let content_type = header_str(response.headers(), CONTENT_TYPE.as_str())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await.map_err(|e| transport_error(&e))?;

        if !status.is_success() {
            return Err(Error::Transport {
                status: Some(status.as_u16()),
                body,
            });
        }

        trace!(url = %self.url, method, content_type = %content_type, "node -> gateway");
        codec::decode_response(&content_type, &body, &encoded.id)
    }

    async fn notify(&mut self, method: &str, params: Value) -> Result<(), Error> {
        let body = codec::encode_notification(method, params)?;
        let response = self
            .post(body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport {
                status: Some(status.as_u16()),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(id) = self.session_id.take() {
            if let Err(e) = self.release(&id).send().await {
                debug!(url = %self.url, session = %id, error = %e, "failed to release node session");
            }
        }
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let Some(id) = self.session_id.take() else {
            return;
        };
        // Dropped mid-call: release the remote session in the background.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let request = self.release(&id);
            handle.spawn(async move {
                let _ = request.send().await;
            });
        }
    }
}
