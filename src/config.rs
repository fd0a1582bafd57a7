//! Simulator configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::consts::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};

pub const DEFAULT_EC50: f64 = 0.5;
pub const DEFAULT_HILL_N: f64 = 1.5;
pub const DEFAULT_BATH_VOLUME: f64 = 20.0;
pub const DEFAULT_MAX_ANGLE_DEG: f64 = 20.0;
pub const DEFAULT_WASH_DURATION_MS: f64 = 1500.0;
pub const DEFAULT_INJECT_DURATION_MS: f64 = 3000.0;
pub const DEFAULT_WASH_DECAY_K: f64 = 5.0;
pub const DEFAULT_INJECT_STEEPNESS: f64 = 10.0;
pub const DEFAULT_INJECT_SCROLL_BUDGET: f64 = 60.0;
pub const DEFAULT_WASH_SCROLL_NUDGE: f64 = 20.0;
pub const DEFAULT_VIEWPORT_PADDING: f64 = 40.0;
pub const DEFAULT_VIEWPORT_MAX_HEIGHT: f64 = 600.0;

/// Error returned by [`SimulatorConfig::from_env`] and [`SimulatorConfig::validate`].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} is out of range: {value}")]
    Invalid { field: &'static str, value: f64 },
}

/// Dose-response curve constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoseResponse {
    /// Bath concentration producing half the maximal response.
    pub ec50: f64,
    /// Hill coefficient.
    pub hill_n: f64,
    /// Organ bath volume used to dilute the dose.
    pub bath_volume: f64,
}

/// Timeline durations and easing constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineTuning {
    pub wash_duration_ms: f64,
    pub inject_duration_ms: f64,
    /// Decay rate `k` in the wash easing `1 - e^(-k p)`.
    pub wash_decay_k: f64,
    /// Logistic slope of the injection S-curve.
    pub inject_steepness: f64,
    /// Total scroll applied to a region over one injection.
    pub inject_scroll_budget: f64,
    /// Scroll spacing added after a wash completes.
    pub wash_scroll_nudge: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    pub dose: DoseResponse,
    /// Lever rotation, in degrees, at a 100% response.
    pub max_angle_deg: f64,
    pub timeline: TimelineTuning,
    /// Horizontal padding subtracted from the container before fitting.
    pub viewport_padding: f64,
    /// Cap on the usable container height.
    pub viewport_max_height: f64,
    pub default_canvas_width: f64,
    pub default_canvas_height: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            dose: DoseResponse { ec50: DEFAULT_EC50, hill_n: DEFAULT_HILL_N, bath_volume: DEFAULT_BATH_VOLUME },
            max_angle_deg: DEFAULT_MAX_ANGLE_DEG,
            timeline: TimelineTuning {
                wash_duration_ms: DEFAULT_WASH_DURATION_MS,
                inject_duration_ms: DEFAULT_INJECT_DURATION_MS,
                wash_decay_k: DEFAULT_WASH_DECAY_K,
                inject_steepness: DEFAULT_INJECT_STEEPNESS,
                inject_scroll_budget: DEFAULT_INJECT_SCROLL_BUDGET,
                wash_scroll_nudge: DEFAULT_WASH_SCROLL_NUDGE,
            },
            viewport_padding: DEFAULT_VIEWPORT_PADDING,
            viewport_max_height: DEFAULT_VIEWPORT_MAX_HEIGHT,
            default_canvas_width: DEFAULT_CANVAS_WIDTH,
            default_canvas_height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

impl SimulatorConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// Optional:
    /// - `KYMO_EC50`, `KYMO_HILL_N`, `KYMO_BATH_VOLUME`
    /// - `KYMO_MAX_ANGLE_DEG`
    /// - `KYMO_WASH_DURATION_MS`, `KYMO_INJECT_DURATION_MS`
    /// - `KYMO_WASH_DECAY_K`, `KYMO_INJECT_STEEPNESS`
    /// - `KYMO_INJECT_SCROLL_BUDGET`, `KYMO_WASH_SCROLL_NUDGE`
    /// - `KYMO_VIEWPORT_PADDING`, `KYMO_VIEWPORT_MAX_HEIGHT`
    ///
    /// Unparsable values are ignored; parsed values must still pass [`Self::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is non-positive or not finite.
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();
        let cfg = Self {
            dose: DoseResponse {
                ec50: env_parse_f64("KYMO_EC50", d.dose.ec50),
                hill_n: env_parse_f64("KYMO_HILL_N", d.dose.hill_n),
                bath_volume: env_parse_f64("KYMO_BATH_VOLUME", d.dose.bath_volume),
            },
            max_angle_deg: env_parse_f64("KYMO_MAX_ANGLE_DEG", d.max_angle_deg),
            timeline: TimelineTuning {
                wash_duration_ms: env_parse_f64("KYMO_WASH_DURATION_MS", d.timeline.wash_duration_ms),
                inject_duration_ms: env_parse_f64("KYMO_INJECT_DURATION_MS", d.timeline.inject_duration_ms),
                wash_decay_k: env_parse_f64("KYMO_WASH_DECAY_K", d.timeline.wash_decay_k),
                inject_steepness: env_parse_f64("KYMO_INJECT_STEEPNESS", d.timeline.inject_steepness),
                inject_scroll_budget: env_parse_f64("KYMO_INJECT_SCROLL_BUDGET", d.timeline.inject_scroll_budget),
                wash_scroll_nudge: env_parse_f64("KYMO_WASH_SCROLL_NUDGE", d.timeline.wash_scroll_nudge),
            },
            viewport_padding: env_parse_f64("KYMO_VIEWPORT_PADDING", d.viewport_padding),
            viewport_max_height: env_parse_f64("KYMO_VIEWPORT_MAX_HEIGHT", d.viewport_max_height),
            ..d
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject constants that would make the curve, easing, or fit degenerate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("ec50", self.dose.ec50),
            ("hill_n", self.dose.hill_n),
            ("bath_volume", self.dose.bath_volume),
            ("max_angle_deg", self.max_angle_deg),
            ("wash_duration_ms", self.timeline.wash_duration_ms),
            ("inject_duration_ms", self.timeline.inject_duration_ms),
            ("wash_decay_k", self.timeline.wash_decay_k),
            ("inject_steepness", self.timeline.inject_steepness),
            ("viewport_max_height", self.viewport_max_height),
            ("default_canvas_width", self.default_canvas_width),
            ("default_canvas_height", self.default_canvas_height),
        ];
        for (field, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid { field, value });
            }
        }
        let non_negative = [
            ("inject_scroll_budget", self.timeline.inject_scroll_budget),
            ("wash_scroll_nudge", self.timeline.wash_scroll_nudge),
            ("viewport_padding", self.viewport_padding),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid { field, value });
            }
        }
        Ok(())
    }
}

fn env_parse_f64(key: &str, default: f64) -> f64 {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<f64>().unwrap_or(default),
        Err(_) => default,
    }
}
