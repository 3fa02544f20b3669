//! Fixed mapping from failures to HTTP status responses.
//!
//! Each helper sends a plain-text body (the caller may override the
//! default) and logs a warning naming the status. Internal error details
//! stay in the log sink.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::logging::Logger;

fn respond(log: &Logger, status: StatusCode, default: &str, message: Option<&str>) -> Response {
    let reason = status.canonical_reason().unwrap_or("Unknown");
    log.warn(
        &format!("Returned {} {}.", status.as_u16(), reason),
        message.map(|m| json!({ "message": m })),
    );
    let body = message.unwrap_or(default).to_string();
    (status, body).into_response()
}

pub fn bad_request(log: &Logger, message: Option<&str>) -> Response {
    respond(log, StatusCode::BAD_REQUEST, "Bad request.\n", message)
}

pub fn unauthorized(log: &Logger, message: Option<&str>) -> Response {
    respond(log, StatusCode::UNAUTHORIZED, "Unauthorized.\n", message)
}

pub fn not_found(log: &Logger, message: Option<&str>) -> Response {
    respond(log, StatusCode::NOT_FOUND, "Not found.\n", message)
}

pub fn conflict(log: &Logger, message: Option<&str>) -> Response {
    respond(log, StatusCode::CONFLICT, "Server conflict.\n", message)
}

pub fn too_large(log: &Logger, message: Option<&str>) -> Response {
    respond(
        log,
        StatusCode::PAYLOAD_TOO_LARGE,
        "Payload too large.\n",
        message,
    )
}

pub fn server_error(log: &Logger, message: Option<&str>) -> Response {
    respond(
        log,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Server error.\n",
        message,
    )
}

pub fn not_implemented(log: &Logger, message: Option<&str>) -> Response {
    respond(
        log,
        StatusCode::NOT_IMPLEMENTED,
        "Not implemented.\n",
        message,
    )
}
