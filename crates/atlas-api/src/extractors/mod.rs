//! Request extractors.

pub mod auth;

pub use auth::{AuthUser, RequestContext};

use axum::http::HeaderMap;

/// Best-effort client IP: first `X-Forwarded-For` entry, else unknown.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Client user-agent header, if present.
pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
