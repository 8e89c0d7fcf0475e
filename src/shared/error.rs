//! Usage: Unified application error model (maps internal failures to `CODE: message` strings
//! and JSON responses).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

pub type AppResult<T> = Result<T, AppError>;

pub(crate) const AUTHORIZE_ROUTE: &str = "/api/auth/authorize";

#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AppError {
    code: String,
    message: String,
    upstream_status: Option<u16>,
    upstream_body: Option<String>,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            upstream_status: None,
            upstream_body: None,
            source: None,
        }
    }

    /// Non-OK upstream response forwarded to the caller with its original status.
    pub(crate) fn upstream_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            code: "UPSTREAM_STATUS".to_string(),
            message: format!("upstream returned status={status}"),
            upstream_status: Some(status),
            upstream_body: Some(body),
            source: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn upstream_status_code(&self) -> Option<u16> {
        self.upstream_status
    }

    pub(crate) fn http_status(&self) -> StatusCode {
        match self.code.as_str() {
            "UPSTREAM_RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            "AUTH_REQUIRED" => StatusCode::UNAUTHORIZED,
            "SEC_INVALID_INPUT" => StatusCode::BAD_REQUEST,
            "UPSTREAM_UNAVAILABLE" => StatusCode::BAD_GATEWAY,
            "UPSTREAM_STATUS" => self
                .upstream_status_code()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        let mut body = json!({
            "error": self.message,
            "code": self.code,
        });
        if self.code == "AUTH_REQUIRED" {
            body["authorizeUrl"] = Value::String(AUTHORIZE_ROUTE.to_string());
        }
        if let Some(raw) = self.upstream_body.as_deref() {
            body["details"] = serde_json::from_str::<Value>(raw)
                .unwrap_or_else(|_| Value::String(raw.to_string()));
        }
        body
    }
}

fn split_code_message(raw: &str) -> Option<(&str, &str)> {
    let msg = raw.trim();
    let msg = msg.strip_prefix("Error:").unwrap_or(msg).trim();
    if msg.is_empty() {
        return None;
    }

    let (maybe_code, rest) = msg.split_once(':')?;
    let code = maybe_code.trim();
    if code.is_empty() {
        return None;
    }
    let mut chars = code.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    if !chars.all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_') {
        return None;
    }
    Some((code, rest.trim()))
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        if let Some((code, rest)) = split_code_message(&value) {
            let message = if rest.is_empty() { value.trim() } else { rest };
            return AppError::new(code.to_string(), message.to_string());
        }
        AppError::new("INTERNAL_ERROR", value)
    }
}

impl From<&'static str> for AppError {
    fn from(value: &'static str) -> Self {
        AppError::from(value.to_string())
    }
}

impl From<AppError> for String {
    fn from(value: AppError) -> Self {
        value.to_string()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(
                code = %self.code,
                status = status.as_u16(),
                "request failed: {}",
                self.message
            );
        } else {
            tracing::debug!(
                code = %self.code,
                status = status.as_u16(),
                "request rejected: {}",
                self.message
            );
        }
        (status, Json(self.body())).into_response()
    }
}
