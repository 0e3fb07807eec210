//! Unified application error types for Atlas.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The optional machine `code`
//! distinguishes authentication failure terminals that share one HTTP
//! status, and `retry_after_seconds` carries the lockout/rate-limit
//! backoff hint into response bodies.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Input validation failed.
    Validation,
    /// Authentication failed (missing/invalid/expired token, bad credentials).
    Authentication,
    /// The caller does not have permission to perform the action.
    Authorization,
    /// The account or identifier is temporarily locked out.
    Locked,
    /// The requested resource was not found.
    NotFound,
    /// A conflict occurred (duplicate email, concurrent modification).
    Conflict,
    /// A rate limit was exceeded.
    RateLimit,
    /// A database error occurred.
    Database,
    /// A cache error occurred.
    Cache,
    /// A configuration error occurred.
    Configuration,
    /// An internal server error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Locked => write!(f, "LOCKED"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Database => write!(f, "DATABASE"),
            Self::Cache => write!(f, "CACHE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Machine-readable error codes for failure terminals that share a status.
pub mod codes {
    /// No bearer token on the request.
    pub const AUTH_NO_TOKEN: &str = "AUTH_NO_TOKEN";
    /// Token is structurally or cryptographically invalid.
    pub const AUTH_MALFORMED: &str = "AUTH_MALFORMED";
    /// Token signature is fine but the token has expired.
    pub const AUTH_EXPIRED: &str = "AUTH_EXPIRED";
    /// Token (or its session) has been revoked.
    pub const AUTH_REVOKED: &str = "AUTH_REVOKED";
    /// The identity behind the token no longer exists or is deactivated.
    pub const AUTH_IDENTITY_MISSING: &str = "AUTH_IDENTITY_MISSING";
    /// The token was issued before the identity's last password change.
    pub const AUTH_STALE_PASSWORD: &str = "AUTH_STALE_PASSWORD";
    /// The account or (ip, email) identifier is locked out.
    pub const ACCOUNT_LOCKED: &str = "ACCOUNT_LOCKED";
    /// The presented refresh token matches no stored session (possible replay).
    pub const SESSION_NOT_FOUND: &str = "SESSION_NOT_FOUND";
}

/// The unified application error used throughout Atlas.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// Optional machine-readable code (see [`codes`]).
    pub code: Option<&'static str>,
    /// A human-readable error message.
    pub message: String,
    /// Backoff hint for `Locked` and `RateLimit` errors.
    pub retry_after_seconds: Option<u64>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            retry_after_seconds: None,
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            retry_after_seconds: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attach a machine-readable code.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Create a lockout error carrying the retry-after hint.
    pub fn locked(message: impl Into<String>, retry_after_seconds: u64) -> Self {
        Self {
            kind: ErrorKind::Locked,
            code: Some(codes::ACCOUNT_LOCKED),
            message: message.into(),
            retry_after_seconds: Some(retry_after_seconds),
            source: None,
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a rate-limit error carrying the retry-after hint.
    pub fn rate_limited(message: impl Into<String>, retry_after_seconds: u64) -> Self {
        Self {
            kind: ErrorKind::RateLimit,
            code: None,
            message: message.into(),
            retry_after_seconds: Some(retry_after_seconds),
            source: None,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            code: self.code,
            message: self.message.clone(),
            retry_after_seconds: self.retry_after_seconds,
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Internal,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_carries_retry_after() {
        let err = AppError::locked("Account locked", 900);
        assert_eq!(err.kind, ErrorKind::Locked);
        assert_eq!(err.code, Some(codes::ACCOUNT_LOCKED));
        assert_eq!(err.retry_after_seconds, Some(900));
    }

    #[test]
    fn with_code_attaches_code() {
        let err = AppError::authentication("expired").with_code(codes::AUTH_EXPIRED);
        assert_eq!(err.code, Some(codes::AUTH_EXPIRED));
    }
}
