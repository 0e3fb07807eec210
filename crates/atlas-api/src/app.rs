//! Application builder — wires repositories, auth services, and the
//! router into a running server.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use atlas_auth::lockout::LockoutGuard;
use atlas_auth::password::{PasswordHasher, PasswordValidator};
use atlas_auth::session::{SessionManager, SessionStore, rotation};
use atlas_auth::token::{NoopBlacklist, TokenIssuer, TokenVerifier};
use atlas_cache::provider::CacheManager;
use atlas_core::config::AppConfig;
use atlas_core::error::AppError;
use atlas_database::repositories::{session::SessionRepository, user::UserRepository};
use atlas_notify::{LogNotifier, Notifier};

use crate::error::set_production_mode;
use crate::middleware::rate_limit::RateLimiter;
use crate::router::build_router;
use crate::state::AppState;

/// Requests allowed in a burst against the auth routes, per client IP.
const AUTH_RATE_BURST: u32 = 20;

/// Auth route token refill rate per second, per client IP.
const AUTH_RATE_REFILL: f64 = 1.0;

/// Builds the complete application state from configuration.
///
/// Fails fast when the token secrets are missing — the server must not
/// start without them.
pub async fn build_state(
    config: AppConfig,
    db_pool: PgPool,
    notifier: Arc<dyn Notifier>,
) -> Result<AppState, AppError> {
    set_production_mode(config.server.is_production());

    // ── Cache ────────────────────────────────────────────────────
    info!(provider = %config.cache.provider, "Initializing cache");
    let cache = Arc::new(CacheManager::new(&config.cache).await?);

    // ── Repositories ─────────────────────────────────────────────
    let user_repo = Arc::new(UserRepository::new(db_pool.clone()));
    let session_repo = Arc::new(SessionRepository::new(db_pool.clone()));

    // ── Auth services ────────────────────────────────────────────
    let issuer = Arc::new(TokenIssuer::new(&config.auth)?);
    let verifier = Arc::new(TokenVerifier::new(&config.auth)?);
    let hasher = Arc::new(PasswordHasher::new());
    let password_validator = Arc::new(PasswordValidator::new(&config.auth));

    let store = Arc::new(SessionStore::new(
        Arc::clone(&session_repo),
        config.session.clone(),
    ));
    let lockout = Arc::new(LockoutGuard::new(
        Arc::clone(&cache) as Arc<dyn atlas_core::traits::CacheProvider>,
        &config.auth,
    ));
    let rotation_policy: Arc<dyn atlas_auth::session::RotationPolicy> =
        Arc::from(rotation::from_config(&config.session.rotation)?);

    let session_manager = Arc::new(SessionManager::new(
        Arc::clone(&issuer),
        Arc::clone(&verifier),
        Arc::clone(&store),
        Arc::clone(&user_repo),
        Arc::clone(&hasher),
        Arc::clone(&password_validator),
        Arc::clone(&lockout),
        rotation_policy,
        notifier,
        config.auth.clone(),
    ));

    Ok(AppState {
        config: Arc::new(config),
        db_pool,
        cache,
        issuer,
        verifier,
        blacklist: Arc::new(NoopBlacklist),
        session_manager,
        user_repo,
        rate_limiter: RateLimiter::new(AUTH_RATE_BURST, AUTH_RATE_REFILL),
    })
}

/// Runs the Atlas server with the given configuration and database pool.
pub async fn run_server(config: AppConfig, db_pool: PgPool) -> Result<(), AppError> {
    let host = config.server.host.clone();
    let port = config.server.port;

    let state = build_state(config, db_pool, Arc::new(LogNotifier)).await?;
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!("Atlas server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
