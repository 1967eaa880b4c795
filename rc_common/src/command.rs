//! Canonical command types shared by transmitter and receiver.
//!
//! A [`ControlCommand`] is always in range: every constructor clamps, so a
//! value that exists has already been validated. Non-finite inputs collapse
//! to the field's zero point.

use bitflags::bitflags;

use crate::consts::{PERCENT_MAX, PERCENT_MIN, SIGNED_PERCENT_MIN};

bitflags! {
    /// Auxiliary switches carried alongside the analog fields.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AuxFlags: u8 {
        /// Headlight / status LED requested on.
        const LED      = 0x01;
        /// Operator requested a vehicle shutdown.
        const SHUTDOWN = 0x02;
    }
}

impl Default for AuxFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Transport-independent command for one control tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlCommand {
    throttle_percent: f32,
    brake_percent: f32,
    steering_percent: f32,
    aux: AuxFlags,
}

impl ControlCommand {
    /// All-zero command: no throttle, no brake, wheels straight, aux off.
    pub const NEUTRAL: Self = Self {
        throttle_percent: 0.0,
        brake_percent: 0.0,
        steering_percent: 0.0,
        aux: AuxFlags::empty(),
    };

    /// Build a command, clamping every field into its declared bounds.
    pub fn new(throttle_percent: f32, brake_percent: f32, steering_percent: f32) -> Self {
        Self {
            throttle_percent: clamp_finite(throttle_percent, PERCENT_MIN, PERCENT_MAX),
            brake_percent: clamp_finite(brake_percent, PERCENT_MIN, PERCENT_MAX),
            steering_percent: clamp_finite(steering_percent, SIGNED_PERCENT_MIN, PERCENT_MAX),
            aux: AuxFlags::empty(),
        }
    }

    /// Build a command from a signed drive speed.
    ///
    /// Positive speed becomes throttle, negative speed becomes brake.
    pub fn from_drive(speed_percent: f32, steering_percent: f32) -> Self {
        let speed = clamp_finite(speed_percent, SIGNED_PERCENT_MIN, PERCENT_MAX);
        Self::new(speed.max(0.0), (-speed).max(0.0), steering_percent)
    }

    /// Return a copy with the given auxiliary flags.
    #[must_use]
    pub const fn with_aux(mut self, aux: AuxFlags) -> Self {
        self.aux = aux;
        self
    }

    /// Throttle [0, 100] %.
    #[inline]
    pub const fn throttle_percent(&self) -> f32 {
        self.throttle_percent
    }

    /// Brake [0, 100] %.
    #[inline]
    pub const fn brake_percent(&self) -> f32 {
        self.brake_percent
    }

    /// Steering [-100, 100] %, negative is left.
    #[inline]
    pub const fn steering_percent(&self) -> f32 {
        self.steering_percent
    }

    /// Auxiliary flags.
    #[inline]
    pub const fn aux(&self) -> AuxFlags {
        self.aux
    }

    /// Signed drive speed as seen by the drive-style wire schema.
    #[inline]
    pub fn drive_percent(&self) -> f32 {
        (self.throttle_percent - self.brake_percent).clamp(SIGNED_PERCENT_MIN, PERCENT_MAX)
    }

    /// Whether the LED flag is set.
    #[inline]
    pub const fn led(&self) -> bool {
        self.aux.contains(AuxFlags::LED)
    }

    /// Whether the shutdown-request flag is set.
    #[inline]
    pub const fn shutdown_requested(&self) -> bool {
        self.aux.contains(AuxFlags::SHUTDOWN)
    }
}

/// One raw reading from an input device.
///
/// `raw_value` is in the device's native range (e.g. 0..=65535 for an evdev
/// stick, 0..=1023 for a 10-bit ADC, 0/1 for a button).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// Device axis or button code.
    pub axis_id: u16,
    /// Device-native reading.
    pub raw_value: i32,
    /// Capture time since the source started [µs].
    pub timestamp_us: u64,
}

impl RawSample {
    /// Create a sample.
    pub const fn new(axis_id: u16, raw_value: i32, timestamp_us: u64) -> Self {
        Self {
            axis_id,
            raw_value,
            timestamp_us,
        }
    }
}

/// Clamp into `[min, max]`; NaN and infinities become 0.
#[inline]
pub fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        0.0
    }
}
