//! Refresh-token rotation policy.
//!
//! The policy decides, per refresh call, whether the presented refresh
//! token is retired and replaced. It is injected into the session
//! manager so tests can pin either branch deterministically.

use atlas_core::config::session::RotationConfig;
use atlas_core::error::AppError;

/// Decides whether a given refresh call rotates the refresh token.
pub trait RotationPolicy: Send + Sync + std::fmt::Debug + 'static {
    /// Whether this refresh call should rotate.
    fn should_rotate(&self) -> bool;
}

/// Rotate on every refresh. The production default: every use of a
/// refresh token retires it.
#[derive(Debug, Clone, Default)]
pub struct AlwaysRotate;

impl RotationPolicy for AlwaysRotate {
    fn should_rotate(&self) -> bool {
        true
    }
}

/// Never rotate. For tests that need the non-rotating branch.
#[derive(Debug, Clone, Default)]
pub struct NeverRotate;

impl RotationPolicy for NeverRotate {
    fn should_rotate(&self) -> bool {
        false
    }
}

/// Rotate a sampled fraction of refresh calls.
#[derive(Debug, Clone)]
pub struct SampledRotate {
    /// Fraction of calls that rotate, in `[0.0, 1.0]`.
    rate: f64,
}

impl SampledRotate {
    /// Creates a sampled policy with the given rotation rate.
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
        }
    }
}

impl RotationPolicy for SampledRotate {
    fn should_rotate(&self) -> bool {
        rand::random::<f64>() < self.rate
    }
}

/// Builds the configured rotation policy.
pub fn from_config(config: &RotationConfig) -> Result<Box<dyn RotationPolicy>, AppError> {
    match config.strategy.as_str() {
        "always" => Ok(Box::new(AlwaysRotate)),
        "never" => Ok(Box::new(NeverRotate)),
        "sampled" => Ok(Box::new(SampledRotate::new(config.sample_rate))),
        other => Err(AppError::configuration(format!(
            "Unknown rotation strategy: '{other}'. Supported: always, sampled, never"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_policies() {
        assert!(AlwaysRotate.should_rotate());
        assert!(!NeverRotate.should_rotate());
    }

    #[test]
    fn test_sampled_extremes() {
        assert!(SampledRotate::new(1.0).should_rotate());
        assert!(!SampledRotate::new(0.0).should_rotate());
    }

    #[test]
    fn test_from_config_rejects_unknown() {
        let config = RotationConfig {
            strategy: "coin-flip".to_string(),
            sample_rate: 0.5,
        };
        assert!(from_config(&config).is_err());
    }
}
