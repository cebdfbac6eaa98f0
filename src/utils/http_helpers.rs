//! Structured HTTP error envelope.
//!
//! Every failure surfaces to the client as the same JSON shape:
//! `{"httpStatus": ..., "httpCode": ..., "requestId": ..., "errors": [...]}`.
//! Server-fault-class statuses (401/403/500) always ship an empty `errors`
//! array so internal detail never leaks; the detail still goes to the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// A single entry in the error envelope's `errors` array.
#[derive(Debug, Clone, Serialize)]
pub struct SubError {
    pub code: String,
    pub message: String,
}

impl SubError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        SubError {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// An error a handler or middleware stage decided to terminate the request
/// with. Holds the full internal detail; the envelope written to the wire is
/// derived from it in `into_response_with`.
#[derive(Debug, Clone)]
pub struct HandlerError {
    status: StatusCode,
    errors: Vec<SubError>,
}

/// The wire shape of an error response.
#[derive(Debug, Serialize)]
pub struct HttpError {
    #[serde(rename = "httpStatus")]
    pub status: u16,
    #[serde(rename = "httpCode")]
    pub code: &'static str,
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub errors: Vec<SubError>,
}

fn http_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::INTERNAL_SERVER_ERROR => "internal_server_error",
        StatusCode::CONFLICT => "conflict",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::FORBIDDEN => "forbidden",
        _ => "",
    }
}

/// Statuses whose envelopes must not carry error detail.
fn suppress_detail(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::INTERNAL_SERVER_ERROR | StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED
    )
}

impl HandlerError {
    pub fn new(status: StatusCode, errors: Vec<SubError>) -> Self {
        HandlerError { status, errors }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn sub_errors(&self) -> &[SubError] {
        &self.errors
    }

    pub fn unauthorized() -> Self {
        HandlerError::new(StatusCode::UNAUTHORIZED, Vec::new())
    }

    /// An unauthorized response with internal detail for the logs.
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        HandlerError::new(
            StatusCode::UNAUTHORIZED,
            vec![SubError::new("invalid_scope", message)],
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HandlerError::new(
            StatusCode::NOT_FOUND,
            vec![SubError::new("not_found", message)],
        )
    }

    pub fn format_error(message: impl Into<String>) -> Self {
        HandlerError::new(
            StatusCode::BAD_REQUEST,
            vec![SubError::new("format_error", message)],
        )
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        HandlerError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            vec![SubError::new("unexpected_server_error", message)],
        )
    }

    /// Logs the failure and converts it into the wire envelope, attaching the
    /// request id. Middleware stages use this; handlers returning a
    /// `HandlerError` go through the `IntoResponse` impl instead.
    pub fn into_response_with(self, request_id: &str) -> Response {
        let detail: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect();
        tracing::error!(
            status = self.status.as_u16(),
            request_id,
            errors = ?detail,
            "request failed"
        );

        let errors = if suppress_detail(self.status) {
            Vec::new()
        } else {
            self.errors
        };

        let body = HttpError {
            status: self.status.as_u16(),
            code: http_code(self.status),
            request_id: request_id.to_string(),
            errors,
        };

        (self.status, Json(body)).into_response()
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        self.into_response_with("")
    }
}

/// Abbreviates a bearer token for log output, revealing at most the first
/// four characters.
pub fn abbreviate_token(token: &str) -> String {
    let reveal: String = token.chars().take(4).collect();
    format!("{}...", reveal)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 401 envelopes keep the status and code but drop the error detail.
    #[test]
    fn test_unauthorized_envelope_suppresses_detail() {
        let err = HandlerError::invalid_scope("context does not have scope set");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_envelope_serialization() {
        let body = HttpError {
            status: 401,
            code: http_code(StatusCode::UNAUTHORIZED),
            request_id: String::new(),
            errors: Vec::new(),
        };
        let serialized = serde_json::to_string(&body).unwrap();
        assert_eq!(
            serialized,
            r#"{"httpStatus":401,"httpCode":"unauthorized","requestId":"","errors":[]}"#
        );
    }

    #[test]
    fn test_bad_request_envelope_keeps_detail() {
        let body = HttpError {
            status: 400,
            code: http_code(StatusCode::BAD_REQUEST),
            request_id: "abc".to_string(),
            errors: vec![SubError::new("format_error", "invalid input format")],
        };
        let serialized = serde_json::to_string(&body).unwrap();
        assert!(serialized.contains(r#""code":"format_error""#));
        assert!(serialized.contains(r#""requestId":"abc""#));
    }

    #[test]
    fn test_abbreviate_token() {
        assert_eq!(abbreviate_token("supersecret"), "supe...");
        assert_eq!(abbreviate_token("ab"), "ab...");
        assert_eq!(abbreviate_token(""), "...");
    }

    /// Abbreviation counts characters, not bytes, so multi-byte tokens do
    /// not split a code point.
    #[test]
    fn test_abbreviate_token_multibyte() {
        assert_eq!(abbreviate_token("ü¶és"), "ü¶és...");
        assert_eq!(abbreviate_token("日本語トークン"), "日本語ト...");
    }
}
