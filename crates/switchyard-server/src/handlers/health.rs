use axum::http::StatusCode;

/// Liveness only; nodes are never contacted.
pub async fn health() -> StatusCode {
    StatusCode::OK
}
