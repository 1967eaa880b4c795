//! Per-field deadband.
//!
//! A field within `threshold` of its zero point (boundary included) snaps to
//! the zero point before any derived value is computed. Stick jitter around
//! center therefore never reaches the actuators.

use rc_common::command::ControlCommand;
use rc_common::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Deadband for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadbandBand {
    /// Value the field snaps to [%].
    pub zero_point: f32,
    /// Half-width of the band [%]. 0 disables the band.
    pub threshold: f32,
}

impl Default for DeadbandBand {
    fn default() -> Self {
        Self::disabled()
    }
}

impl DeadbandBand {
    /// Band around zero.
    pub const fn around_zero(threshold: f32) -> Self {
        Self {
            zero_point: 0.0,
            threshold,
        }
    }

    /// No band: only the exact zero point snaps (to itself).
    pub const fn disabled() -> Self {
        Self::around_zero(0.0)
    }

    /// Snap `value` to the zero point if inside the band.
    #[inline]
    pub fn apply(&self, value: f32) -> f32 {
        if (value - self.zero_point).abs() <= self.threshold {
            self.zero_point
        } else {
            value
        }
    }

    fn validate(&self, field: &str, min: f32, max: f32) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || !(0.0..100.0).contains(&self.threshold) {
            return Err(ConfigError::ValidationError(format!(
                "deadband.{field}.threshold must be in [0, 100), got {}",
                self.threshold
            )));
        }
        if !self.zero_point.is_finite() || !(min..=max).contains(&self.zero_point) {
            return Err(ConfigError::ValidationError(format!(
                "deadband.{field}.zero_point must be in [{min}, {max}], got {}",
                self.zero_point
            )));
        }
        Ok(())
    }
}

/// Deadbands for every command field.
///
/// ```toml
/// [deadband]
/// steering = { zero_point = 0.0, threshold = 5.0 }
/// brake = { zero_point = 0.0, threshold = 5.0 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deadband {
    /// Throttle band.
    pub throttle: DeadbandBand,
    /// Brake band.
    pub brake: DeadbandBand,
    /// Steering band.
    pub steering: DeadbandBand,
}

impl Default for Deadband {
    fn default() -> Self {
        Self {
            throttle: DeadbandBand::disabled(),
            brake: DeadbandBand::around_zero(5.0),
            steering: DeadbandBand::around_zero(5.0),
        }
    }
}

impl Deadband {
    /// No deadband on any field.
    pub const fn none() -> Self {
        Self {
            throttle: DeadbandBand::disabled(),
            brake: DeadbandBand::disabled(),
            steering: DeadbandBand::disabled(),
        }
    }

    /// Apply all bands. Aux flags pass through untouched.
    pub fn apply(&self, cmd: &ControlCommand) -> ControlCommand {
        ControlCommand::new(
            self.throttle.apply(cmd.throttle_percent()),
            self.brake.apply(cmd.brake_percent()),
            self.steering.apply(cmd.steering_percent()),
        )
        .with_aux(cmd.aux())
    }

    /// Validate thresholds and zero points.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.throttle.validate("throttle", 0.0, 100.0)?;
        self.brake.validate("brake", 0.0, 100.0)?;
        self.steering.validate("steering", -100.0, 100.0)
    }
}
