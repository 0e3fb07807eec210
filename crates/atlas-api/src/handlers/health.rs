//! Health check handlers.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use atlas_core::traits::cache::CacheProvider;

use crate::state::AppState;

/// GET /api/health — liveness with dependency probes.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = atlas_database::connection::health_check(&state.db_pool)
        .await
        .unwrap_or(false);
    let cache = state.cache.health_check().await.unwrap_or(false);

    Json(json!({
        "status": if database && cache { "ok" } else { "degraded" },
        "database": database,
        "cache": cache,
    }))
}
