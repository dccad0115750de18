//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Bodies longer than this many bytes are truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The JSON fields whose values are never logged.
const REDACTED_FIELDS: [&str; 3] = ["password", "current_password", "new_password"];
const REDACTED_VALUE: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords in JSON request bodies are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let display_text = redact_passwords(&String::from_utf8_lossy(&body_bytes));
    tracing::info!("Received request: {} {}", parts.method, parts.uri);
    log_body("request", &display_text);

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!("Sending response: {}", parts.status);
    log_body("response", &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

async fn read_body(body: Body) -> Result<Bytes, axum::Error> {
    axum::body::to_bytes(body, usize::MAX).await
}

/// Replace the values of password fields in a JSON object body.
///
/// Bodies that are not JSON objects are returned unchanged.
fn redact_passwords(body_text: &str) -> String {
    let Ok(Value::Object(mut fields)) = serde_json::from_str::<Value>(body_text) else {
        return body_text.to_owned();
    };

    let mut redacted = false;

    for field in REDACTED_FIELDS {
        if let Some(value) = fields.get_mut(field) {
            *value = Value::String(REDACTED_VALUE.to_owned());
            redacted = true;
        }
    }

    if redacted {
        Value::Object(fields).to_string()
    } else {
        body_text.to_owned()
    }
}

/// The longest prefix of `text` that is at most `limit` bytes and ends on a character boundary.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_body(direction: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("{direction} body: {}...", truncate(body, LOG_BODY_LENGTH_LIMIT));
        tracing::debug!("Full {direction} body: {body:?}");
    } else {
        tracing::info!("{direction} body: {body:?}");
    }
}
