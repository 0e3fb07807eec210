//! Network transport consumed by the session controller.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::audit::SecurityEvent;

/// Errors a transport call can surface.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request could not reach the server.
    #[error("network failure: {0}")]
    Network(String),
    /// The request exceeded its finite timeout.
    #[error("request timed out")]
    Timeout,
    /// The server rejected the refresh token as expired.
    #[error("refresh token expired")]
    Expired,
    /// The server rejected the refresh token as revoked.
    #[error("refresh token revoked")]
    Revoked,
    /// Any other server-side rejection.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// A freshly minted access token from a successful refresh.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    /// The new access token.
    pub access_token: String,
    /// Lifetime of the new token.
    pub expires_in: Duration,
}

/// The auth endpoints the controller calls.
///
/// Implementations own the HTTP mechanics (and the refresh cookie, which
/// the browser attaches automatically). The controller imposes its own
/// finite timeout on `refresh`.
#[async_trait]
pub trait AuthTransport: Send + Sync + std::fmt::Debug + 'static {
    /// Exchange the refresh cookie for a new access token.
    async fn refresh(&self) -> Result<RefreshedToken, TransportError>;

    /// Tell the server to drop the current session.
    async fn logout(&self) -> Result<(), TransportError>;

    /// Best-effort mirror of a security event to the server.
    async fn mirror_event(&self, event: &SecurityEvent) -> Result<(), TransportError>;
}
