//! Session management configuration.

use serde::{Deserialize, Serialize};

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum concurrent sessions (devices) per user. The oldest session
    /// is evicted when a login would exceed this cap.
    #[serde(default = "default_max_sessions")]
    pub max_sessions_per_user: u32,
    /// TTL in minutes for the per-user activity marker written on each
    /// authenticated request.
    #[serde(default = "default_activity_ttl")]
    pub activity_ttl_minutes: u64,
    /// Refresh token rotation strategy.
    #[serde(default)]
    pub rotation: RotationConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions_per_user: default_max_sessions(),
            activity_ttl_minutes: default_activity_ttl(),
            rotation: RotationConfig::default(),
        }
    }
}

/// Refresh token rotation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Strategy: `"always"`, `"sampled"`, or `"never"`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Fraction of refresh calls that rotate when the strategy is `"sampled"`.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            sample_rate: default_sample_rate(),
        }
    }
}

fn default_max_sessions() -> u32 {
    10
}

fn default_activity_ttl() -> u64 {
    30
}

fn default_strategy() -> String {
    "always".to_string()
}

fn default_sample_rate() -> f64 {
    0.1
}
