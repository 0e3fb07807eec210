//! Shared application state threaded through every handler.

use std::sync::Arc;

use sqlx::PgPool;

use atlas_auth::session::SessionManager;
use atlas_auth::token::{TokenBlacklist, TokenIssuer, TokenVerifier};
use atlas_cache::provider::CacheManager;
use atlas_core::config::AppConfig;
use atlas_database::repositories::user::UserRepository;

use crate::middleware::rate_limit::RateLimiter;

/// Application state available to all handlers via Axum's `State`.
#[derive(Clone)]
pub struct AppState {
    /// Merged application configuration.
    pub config: Arc<AppConfig>,
    /// Database pool (health checks).
    pub db_pool: PgPool,
    /// Shared cache (activity markers, lockout state).
    pub cache: Arc<CacheManager>,
    /// Token issuance.
    pub issuer: Arc<TokenIssuer>,
    /// Token verification.
    pub verifier: Arc<TokenVerifier>,
    /// Revocation list consulted before verification.
    pub blacklist: Arc<dyn TokenBlacklist>,
    /// Session lifecycle orchestration.
    pub session_manager: Arc<SessionManager>,
    /// User repository (identity loads, profile updates).
    pub user_repo: Arc<UserRepository>,
    /// Per-IP token bucket for the auth routes.
    pub rate_limiter: RateLimiter,
}
