use axum::{
    body::{Body, to_bytes},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

const BODY_LIMIT: usize = 1 << 20;
const LOGGED_CHARS: usize = 2048;

/// Logs failed responses: 5xx bodies at error level, 4xx bodies at warn.
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            error!(%method, %path, "Failed to read error response body: {}", e);
            parts.headers.remove(axum::http::header::CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };
    let body_str: String = String::from_utf8_lossy(&bytes).chars().take(LOGGED_CHARS).collect();

    if status.is_server_error() {
        error!(%method, %path, %status, "Server error: {}", body_str);
    } else {
        warn!(%method, %path, %status, "Client error: {}", body_str);
    }

    Response::from_parts(parts, Body::from(bytes))
}
