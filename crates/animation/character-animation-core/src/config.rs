//! Animator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AnimatorError, Result};

/// Tunables for sampling, preloading and playback.
/// Every field has a default so partial JSON payloads are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Upper bound on waiting for one audio resource to become playable.
    pub audio_preload_timeout_ms: u64,
    /// Requests at or past the sequence end are sampled this far before it.
    pub terminal_epsilon_sec: f64,
    /// Floor for the clock length so an empty sequence still gets a clock.
    pub min_clock_duration_sec: f64,
    /// Volume used for sound cues that do not specify one.
    pub default_volume: f32,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            audio_preload_timeout_ms: 5_000,
            terminal_epsilon_sec: 1e-6,
            min_clock_duration_sec: 1e-3,
            default_volume: 1.0,
        }
    }
}

impl AnimatorConfig {
    #[inline]
    pub fn audio_preload_timeout(&self) -> Duration {
        Duration::from_millis(self.audio_preload_timeout_ms)
    }

    /// Reject values that would make sampling or clock math degenerate.
    pub fn validate(&self) -> Result<()> {
        if !(self.terminal_epsilon_sec.is_finite() && self.terminal_epsilon_sec > 0.0) {
            return Err(AnimatorError::InvalidConfig {
                reason: format!(
                    "terminal_epsilon_sec must be finite and > 0, got {}",
                    self.terminal_epsilon_sec
                ),
            });
        }
        if !(self.min_clock_duration_sec.is_finite() && self.min_clock_duration_sec > 0.0) {
            return Err(AnimatorError::InvalidConfig {
                reason: format!(
                    "min_clock_duration_sec must be finite and > 0, got {}",
                    self.min_clock_duration_sec
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(AnimatorError::InvalidConfig {
                reason: format!(
                    "default_volume must be within [0, 1], got {}",
                    self.default_volume
                ),
            });
        }
        Ok(())
    }
}
