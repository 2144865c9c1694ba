use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::ACCEPT, HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive},
    response::{IntoResponse, Response, Sse},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use switchyard_core::Error;
use switchyard_mcp::codec::{CONTENT_TYPE_EVENT_STREAM, CONTENT_TYPE_JSON};
use switchyard_mcp::jsonrpc::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND,
    PARSE_ERROR,
};
use switchyard_mcp::protocol::{
    METHOD_INITIALIZE, METHOD_PING, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, PROTOCOL_VERSION,
};
use switchyard_mcp::tools::{TOOL_CALL_NODE_TOOL, TOOL_LIST_NODES, TOOL_LIST_NODE_TOOLS};
use switchyard_mcp::{GatewayTools, JsonRpcRequest, JsonRpcResponse};

use crate::app_state::AppState;
use crate::session::SessionGuard;

const SERVER_NAME: &str = "switchyard";

/// Streamable HTTP: one JSON-RPC request per POST, answered in the body.
///
/// The answer is a single `message` event when the caller accepts only
/// `text/event-stream`, plain JSON otherwise. Notifications get 202.
pub async fn mcp_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(response) => return (StatusCode::BAD_REQUEST, Json(response)).into_response(),
    };

    let Some(response) = dispatch(&state, request).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    if wants_event_stream(&headers) {
        match Event::default().event("message").json_data(&response) {
            Ok(event) => {
                return Sse::new(tokio_stream::once(Ok::<_, Infallible>(event))).into_response()
            }
            Err(e) => warn!(error = %e, "failed to encode SSE response, falling back to JSON"),
        }
    }
    Json(response).into_response()
}

/// Legacy SSE transport: announce a per-session POST endpoint, then stream
/// every response for that session as a `message` event.
pub async fn mcp_sse(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let (session_id, rx) = state.sessions.open().await;
    info!(session = %session_id, "legacy SSE client connected");

    let guard = SessionGuard::new(state.sessions.clone(), session_id);

    let endpoint = tokio_stream::once(Ok::<_, Infallible>(Event::default()
        .event("endpoint")
        .data(format!("/messages?session_id={session_id}"))));

    let messages = BroadcastStream::new(rx).filter_map(move |result| {
        let message = result.ok()?;
        debug!(session = %guard.id(), "delivering SSE message");
        Some(Ok::<_, Infallible>(Event::default()
            .event("message")
            .json_data(&*message)
            .unwrap_or_else(|_| Event::default().event("message").data("{}"))))
    });

    Sse::new(endpoint.chain(messages)).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub session_id: String,
}

/// Legacy SSE transport: accept a request for an open session and deliver
/// the response on its stream.
pub async fn mcp_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
    body: Bytes,
) -> StatusCode {
    let Ok(session_id) = query.session_id.parse::<Uuid>() else {
        return StatusCode::NOT_FOUND;
    };
    if !state.sessions.contains(session_id).await {
        debug!(session = %query.session_id, "message for unknown session");
        return StatusCode::NOT_FOUND;
    }

    let response = match parse_request(&body) {
        Ok(request) => dispatch(&state, request).await,
        Err(response) => Some(response),
    };

    if let Some(response) = response {
        match serde_json::to_value(&response) {
            Ok(value) => {
                if !state.sessions.send(session_id, value).await {
                    warn!(session = %session_id, "SSE session went away before its response");
                }
            }
            Err(e) => warn!(session = %session_id, error = %e, "failed to encode response"),
        }
    }
    StatusCode::ACCEPTED
}

/// Decode a JSON-RPC 2.0 request, or produce the error response for it.
fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("Parse error: {e}")))?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    if value.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION)
        || !value.get("method").is_some_and(Value::is_string)
    {
        return Err(JsonRpcResponse::error(id, INVALID_REQUEST, "Invalid Request"));
    }

    serde_json::from_value(value)
        .map_err(|e| JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid Request: {e}")))
}

fn wants_event_stream(headers: &HeaderMap) -> bool {
    let accept = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|v| v.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .collect::<Vec<_>>();

    accept.iter().any(|t| t == CONTENT_TYPE_EVENT_STREAM)
        && !accept.iter().any(|t| t == CONTENT_TYPE_JSON)
}

/// Route one request. `None` means it was a notification and gets no answer.
async fn dispatch(state: &AppState, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
    if req.is_notification() {
        debug!(method = %req.method, "received notification");
        return None;
    }

    let response = match req.method.as_str() {
        METHOD_INITIALIZE => handle_initialize(req.id),
        METHOD_PING => JsonRpcResponse::success(req.id, json!({})),
        METHOD_TOOLS_LIST => handle_tools_list(req.id),
        METHOD_TOOLS_CALL => handle_tools_call(state, req.id, req.params).await,
        other => {
            debug!(method = other, "method not found");
            JsonRpcResponse::error(req.id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
        }
    };
    Some(response)
}

fn handle_initialize(id: Value) -> JsonRpcResponse {
    JsonRpcResponse::success(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        }),
    )
}

fn handle_tools_list(id: Value) -> JsonRpcResponse {
    JsonRpcResponse::success(id, json!({ "tools": GatewayTools::definitions() }))
}

/// Why a gateway tool call produced no result.
enum CallError {
    Params(String),
    Gateway(Error),
}

impl From<Error> for CallError {
    fn from(err: Error) -> Self {
        Self::Gateway(err)
    }
}

async fn handle_tools_call(state: &AppState, id: Value, params: Option<Value>) -> JsonRpcResponse {
    let params = params.unwrap_or(Value::Null);
    let Some(tool) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing tool name");
    };
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    match call_gateway_tool(state, tool, &arguments).await {
        Ok(value) => JsonRpcResponse::success(
            id,
            json!({
                "content": [{
                    "type": "text",
                    "text": serde_json::to_string_pretty(&value).unwrap_or_default()
                }],
                "structuredContent": value,
                "isError": false
            }),
        ),
        Err(CallError::Params(message)) => JsonRpcResponse::error(id, INVALID_PARAMS, message),
        Err(CallError::Gateway(err)) => error_response(id, &err),
    }
}

async fn call_gateway_tool(state: &AppState, tool: &str, args: &Value) -> Result<Value, CallError> {
    let gateway = &state.gateway;
    let value = match tool {
        TOOL_LIST_NODES => to_value(&gateway.list_nodes())?,
        TOOL_LIST_NODE_TOOLS => {
            let node_id = required_str(args, "node_id")?;
            to_value(&gateway.list_node_tools(node_id).await?)?
        }
        TOOL_CALL_NODE_TOOL => {
            let node_id = required_str(args, "node_id")?;
            let tool_name = required_str(args, "tool_name")?;
            let arguments = args.get("arguments").cloned();
            to_value(&gateway.call_node_tool(node_id, tool_name, arguments).await?)?
        }
        other => return Err(CallError::Params(format!("Unknown tool: {other}"))),
    };
    Ok(value)
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, CallError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CallError::Params(format!("Missing '{key}' parameter")))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, CallError> {
    serde_json::to_value(value).map_err(|e| CallError::Gateway(Error::Internal(e.to_string())))
}

/// Map a gateway failure onto a JSON-RPC error.
///
/// Node errors pass through verbatim; everything else is tagged with its kind
/// so callers can tell gateway faults from node faults.
fn error_response(id: Value, err: &Error) -> JsonRpcResponse {
    match err {
        Error::UnknownNode(node) => JsonRpcResponse::error_with_data(
            id,
            INVALID_PARAMS,
            err.to_string(),
            Some(json!({ "kind": err.kind(), "node_id": node })),
        ),
        Error::Remote {
            code,
            message,
            data,
        } => JsonRpcResponse::error_with_data(id, *code, message.clone(), data.clone()),
        Error::Transport { status, body } => JsonRpcResponse::error_with_data(
            id,
            INTERNAL_ERROR,
            err.to_string(),
            Some(json!({ "kind": err.kind(), "status": status, "detail": body })),
        ),
        other => JsonRpcResponse::error_with_data(
            id,
            INTERNAL_ERROR,
            other.to_string(),
            Some(json!({ "kind": other.kind(), "detail": other.to_string() })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn event_stream_only_when_json_is_not_accepted() {
        assert!(wants_event_stream(&accept("text/event-stream")));
        assert!(wants_event_stream(&accept("Text/Event-Stream; q=1")));
        assert!(!wants_event_stream(&accept("application/json, text/event-stream")));
        assert!(!wants_event_stream(&accept("application/json")));
        assert!(!wants_event_stream(&HeaderMap::new()));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_request(b"{not json").unwrap_err();
        assert_eq!(err.error.unwrap().code, PARSE_ERROR);
        assert_eq!(err.id, Value::Null);
    }

    #[test]
    fn wrong_version_is_an_invalid_request() {
        let err = parse_request(br#"{"jsonrpc":"1.0","id":7,"method":"ping"}"#).unwrap_err();
        assert_eq!(err.error.unwrap().code, INVALID_REQUEST);
        assert_eq!(err.id, json!(7));

        let err = parse_request(br#"{"jsonrpc":"2.0","id":7}"#).unwrap_err();
        assert_eq!(err.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn remote_errors_keep_their_code_and_data() {
        let err = Error::Remote {
            code: -32001,
            message: "quota exceeded".to_string(),
            data: Some(json!({"retry_after": 30})),
        };
        let response = error_response(json!(1), &err);
        let error = response.error.unwrap();
        assert_eq!(error.code, -32001);
        assert_eq!(error.message, "quota exceeded");
        assert_eq!(error.data, Some(json!({"retry_after": 30})));
    }

    #[test]
    fn wire_faults_are_internal_errors_tagged_with_kind() {
        let response = error_response(json!(1), &Error::EmptyStream);
        let error = response.error.unwrap();
        assert_eq!(error.code, INTERNAL_ERROR);
        assert_eq!(error.data.unwrap()["kind"], "empty_stream");

        let response = error_response(
            json!(2),
            &Error::Transport {
                status: Some(502),
                body: "bad gateway".to_string(),
            },
        );
        let data = response.error.unwrap().data.unwrap();
        assert_eq!(data["kind"], "transport_error");
        assert_eq!(data["status"], 502);
    }
}
