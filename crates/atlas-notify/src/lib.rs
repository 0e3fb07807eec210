//! # atlas-notify
//!
//! Notification capability consumed by the auth flows. Strictly
//! fire-and-forget: callers spawn sends and log failures; a notifier
//! error never propagates back into an auth decision.
//!
//! Template rendering and mail transport live behind this interface and
//! outside this workspace.

use async_trait::async_trait;

use atlas_core::result::AppResult;

/// Security-relevant notification sender.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug + 'static {
    /// Welcome message after registration.
    async fn send_welcome(&self, email: &str, display_name: Option<&str>) -> AppResult<()>;

    /// Security alert (password change, lockout) with the originating IP.
    async fn send_security_alert(&self, email: &str, event: &str, ip: &str) -> AppResult<()>;
}

/// Default notifier: emits structured log records instead of mail.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_welcome(&self, email: &str, display_name: Option<&str>) -> AppResult<()> {
        tracing::info!(email, display_name, "Welcome notification");
        Ok(())
    }

    async fn send_security_alert(&self, email: &str, event: &str, ip: &str) -> AppResult<()> {
        tracing::info!(email, event, ip, "Security alert notification");
        Ok(())
    }
}

/// Silent notifier for tests.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send_welcome(&self, _email: &str, _display_name: Option<&str>) -> AppResult<()> {
        Ok(())
    }

    async fn send_security_alert(&self, _email: &str, _event: &str, _ip: &str) -> AppResult<()> {
        Ok(())
    }
}
