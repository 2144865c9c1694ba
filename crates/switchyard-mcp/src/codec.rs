//! JSON-RPC wire codec for the two response transports a node may use:
//! a plain JSON body, or a server-sent event stream whose last event is the
//! terminal response.

use std::borrow::Cow;

use serde_json::Value;

use switchyard_core::Error;

use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_EVENT_STREAM: &str = "text/event-stream";

/// `Accept` header sent with every outbound request.
pub const ACCEPT_BOTH: &str = "application/json, text/event-stream";

/// The response transport a node chose, derived from its `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseTransport {
    Json,
    EventStream,
}

impl ResponseTransport {
    /// Classify a `Content-Type` header value, ignoring parameters and case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedTransport`] for anything other than JSON or
    /// an event stream.
    pub fn from_content_type(content_type: &str) -> Result<Self, Error> {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match media_type.as_str() {
            CONTENT_TYPE_JSON => Ok(Self::Json),
            CONTENT_TYPE_EVENT_STREAM => Ok(Self::EventStream),
            _ => Err(Error::UnsupportedTransport(content_type.to_string())),
        }
    }
}

/// A serialized request and the id its response must echo.
#[derive(Debug, Clone)]
pub struct EncodedRequest {
    pub id: Value,
    pub body: Vec<u8>,
}

/// Encode `method` and `params` as a JSON-RPC 2.0 request with a fresh id.
///
/// # Errors
///
/// Returns [`Error::Internal`] if serialization fails.
pub fn encode_request(method: &str, params: Value) -> Result<EncodedRequest, Error> {
    let request = JsonRpcRequest::new(method, params);
    let body = serde_json::to_vec(&request)
        .map_err(|e| Error::Internal(format!("failed to encode request: {e}")))?;
    Ok(EncodedRequest {
        id: request.id,
        body,
    })
}

/// Encode a JSON-RPC 2.0 notification.
///
/// # Errors
///
/// Returns [`Error::Internal`] if serialization fails.
pub fn encode_notification(method: &str, params: Value) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(&JsonRpcNotification::new(method, params))
        .map_err(|e| Error::Internal(format!("failed to encode notification: {e}")))
}

/// Pick the data of the last event in an event stream body.
///
/// Events are separated by blank lines; the `data:` lines of one event are
/// joined with `\n`.
///
/// # Errors
///
/// Returns [`Error::EmptyStream`] when no event carries non-empty data.
pub fn last_event_data(body: &str) -> Result<String, Error> {
    let mut last = None;
    let mut event: Vec<&str> = Vec::new();
    for line in body.lines().map(str::trim).chain(std::iter::once("")) {
        if line.is_empty() {
            let data = event.join("\n");
            if !data.trim().is_empty() {
                last = Some(data);
            }
            event.clear();
        } else if let Some(data) = line.strip_prefix("data:") {
            event.push(data.trim());
        }
    }
    last.ok_or(Error::EmptyStream)
}

/// Decode a response body into a JSON-RPC response object.
///
/// # Errors
///
/// Returns [`Error::UnsupportedTransport`], [`Error::EmptyStream`] or
/// [`Error::MalformedResponse`] depending on what is wrong with the body.
pub fn parse_response(content_type: &str, body: &str) -> Result<JsonRpcResponse, Error> {
    let payload = match ResponseTransport::from_content_type(content_type)? {
        ResponseTransport::Json => Cow::Borrowed(body),
        ResponseTransport::EventStream => Cow::Owned(last_event_data(body)?),
    };
    serde_json::from_str(&payload).map_err(|e| Error::MalformedResponse(e.to_string()))
}

/// Check a decoded response against the request id and unwrap its result.
///
/// # Errors
///
/// Returns [`Error::CorrelationMismatch`] when the ids differ and
/// [`Error::Remote`] when the response carries an `error`.
pub fn into_result(response: JsonRpcResponse, expected_id: &Value) -> Result<Value, Error> {
    if response.id != *expected_id {
        return Err(Error::CorrelationMismatch {
            expected: expected_id.clone(),
            actual: response.id,
        });
    }
    if let Some(err) = response.error {
        return Err(Error::Remote {
            code: err.code,
            message: err.message,
            data: err.data,
        });
    }
    Ok(response.result.unwrap_or(Value::Null))
}

/// Decode a response body and return the `result` of the request `expected_id`.
///
/// # Errors
///
/// See [`parse_response`] and [`into_result`].
pub fn decode_response(content_type: &str, body: &str, expected_id: &Value) -> Result<Value, Error> {
    into_result(parse_response(content_type, body)?, expected_id)
}
