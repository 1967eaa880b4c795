//! Electrical values derived from an actuator target.
//!
//! Generating the waveforms is the driver's job. These types only carry the
//! numbers a driver writes: H-bridge duty cycles for the drive motors and a
//! pulse width for the steering servo.

use rc_common::command::clamp_finite;
use rc_common::consts::{PERCENT_MAX, SIGNED_PERCENT_MIN};

/// Signed drive speed split into H-bridge duty cycles.
///
/// At most one side is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveSignal {
    /// Forward leg duty cycle [0, 100] %.
    pub forward_duty_percent: f32,
    /// Reverse leg duty cycle [0, 100] %.
    pub reverse_duty_percent: f32,
}

impl DriveSignal {
    /// Both legs off.
    pub const OFF: Self = Self {
        forward_duty_percent: 0.0,
        reverse_duty_percent: 0.0,
    };

    /// Split a signed speed [-100, 100] %.
    pub fn from_speed(speed_percent: f32) -> Self {
        let speed = clamp_finite(speed_percent, SIGNED_PERCENT_MIN, PERCENT_MAX);
        if speed > 0.0 {
            Self {
                forward_duty_percent: speed,
                reverse_duty_percent: 0.0,
            }
        } else if speed < 0.0 {
            Self {
                forward_duty_percent: 0.0,
                reverse_duty_percent: -speed,
            }
        } else {
            Self::OFF
        }
    }
}

/// Servo pulse geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoGeometry {
    /// Pulse at full left [µs].
    pub min_pulse_us: f32,
    /// Pulse at full right [µs].
    pub max_pulse_us: f32,
    /// Servo frame rate [Hz].
    pub frame_hz: f32,
}

impl Default for ServoGeometry {
    fn default() -> Self {
        Self {
            min_pulse_us: 630.0,
            max_pulse_us: 1330.0,
            frame_hz: 50.0,
        }
    }
}

impl ServoGeometry {
    /// Pulse for wheels straight ahead [µs].
    #[inline]
    pub fn center_pulse_us(&self) -> f32 {
        (self.min_pulse_us + self.max_pulse_us) / 2.0
    }

    /// Frame period [µs].
    #[inline]
    pub fn period_us(&self) -> f32 {
        1_000_000.0 / self.frame_hz
    }
}

/// Steering servo command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoSignal {
    /// High time per frame [µs].
    pub pulse_width_us: f32,
    /// Same value as a duty cycle of the frame [%].
    pub duty_percent: f32,
}

impl ServoSignal {
    /// Map steering [-100, 100] % linearly onto `[min_pulse, max_pulse]`.
    pub fn from_steering(steering_percent: f32, geometry: &ServoGeometry) -> Self {
        let steering = clamp_finite(steering_percent, SIGNED_PERCENT_MIN, PERCENT_MAX);
        let span = geometry.max_pulse_us - geometry.min_pulse_us;
        let pulse_width_us = geometry.min_pulse_us + (steering + 100.0) / 200.0 * span;
        Self {
            pulse_width_us,
            duty_percent: pulse_width_us / geometry.period_us() * 100.0,
        }
    }

    /// Wheels straight ahead.
    pub fn centered(geometry: &ServoGeometry) -> Self {
        Self::from_steering(0.0, geometry)
    }
}
