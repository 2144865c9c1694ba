use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::app_state::AppState;
use crate::handlers;

/// Create the main application router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Streamable HTTP
        .route("/mcp", post(handlers::mcp_request))
        // Legacy SSE: stream on GET /sse, requests on POST /messages?session_id=
        .route("/sse", get(handlers::mcp_sse))
        .route("/messages", post(handlers::mcp_messages))
        // MCP clients run in all sorts of contexts
        .layer(CorsLayer::permissive())
        .with_state(state)
}
