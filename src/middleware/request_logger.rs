use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

const MAX_BODY_LOG_SIZE: usize = 1024; // 1KB limit for body logging
// Matches axum's default extractor limit, so buffering never admits more than the handler would.
const MAX_BODY_BUFFER_SIZE: usize = 2 * 1024 * 1024;
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs each request/response pair and tags it with an `x-request-id`.
///
/// An inbound request id is reused; otherwise one is generated. Handler logs run
/// inside a `request` span carrying the id. Bodies are only logged, redacted and
/// truncated, when `LOG_REQUEST_BODY=true`.
pub async fn request_logger_middleware(req: Request, next: Next) -> Response {
    log_requests(req, next, body_logging_enabled()).await
}

fn body_logging_enabled() -> bool {
    std::env::var("LOG_REQUEST_BODY")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false)
}

async fn log_requests(mut req: Request, next: Next, log_body: bool) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let header_value = HeaderValue::from_str(&request_id).ok();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    if let Some(value) = &header_value {
        req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let response = if log_body {
        let (parts, body) = req.into_parts();
        match axum::body::to_bytes(body, MAX_BODY_BUFFER_SIZE).await {
            Ok(bytes) => {
                tracing::info!(
                    request_id = %request_id,
                    method = %method,
                    uri = %uri,
                    body_size = bytes.len(),
                    body = %loggable_body(&bytes),
                    "Incoming request"
                );

                let req = Request::from_parts(parts, Body::from(bytes));
                run_in_span(req, next, &request_id).await
            }
            Err(_) => {
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    uri = %uri,
                    "Request body too large or failed to read"
                );
                (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
            }
        }
    } else {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            "Incoming request"
        );
        run_in_span(req, next, &request_id).await
    };

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = latency.as_millis(),
        "Outgoing response"
    );

    let (mut parts, body) = response.into_parts();
    if let Some(value) = header_value {
        parts.headers.insert(REQUEST_ID_HEADER, value);
    }

    Response::from_parts(parts, body)
}

async fn run_in_span(req: Request, next: Next, request_id: &str) -> Response {
    let span = tracing::info_span!("request", request_id = %request_id);
    next.run(req).instrument(span).await
}

/// Redacted rendering of a request body, cut to `MAX_BODY_LOG_SIZE` characters.
fn loggable_body(bytes: &[u8]) -> String {
    let rendered = match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(json) => {
            let sanitized = crate::utils::sanitize::sanitize_json(&json);
            serde_json::to_string(&sanitized).unwrap_or_else(|_| "[invalid json]".to_string())
        }
        Err(_) => return format!("[non-json, {} bytes]", bytes.len()),
    };

    if rendered.chars().count() <= MAX_BODY_LOG_SIZE {
        return rendered;
    }
    let mut truncated: String = rendered.chars().take(MAX_BODY_LOG_SIZE).collect();
    truncated.push_str("...[truncated]");
    truncated
}
