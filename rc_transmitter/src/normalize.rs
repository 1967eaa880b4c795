//! Raw device samples to command fields.
//!
//! Bipolar axes (steering, speed) scale each side of the calibrated center
//! separately, so an off-center rest position still reaches ±100 at both
//! ends and reads exactly 0 at rest. Unipolar axes (throttle, brake) scale
//! `[min, max]` onto `[0, 100]`. Everything is clamped after scaling, so a
//! device that overshoots its calibration is accepted.

use std::collections::HashMap;

use rc_common::command::{AuxFlags, RawSample};
use rc_common::config::ConfigError;
use rc_common::consts::{PERCENT_MAX, PERCENT_MIN, SIGNED_PERCENT_MIN};

use crate::config::{AxisConfig, AxisRole};

/// One normalized field, ready to merge into the current command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandField {
    /// [0, 100] %.
    Throttle(f32),
    /// [0, 100] %.
    Brake(f32),
    /// [-100, 100] %.
    Steering(f32),
    /// [-100, 100] %, split into throttle and brake when applied.
    Speed(f32),
    /// Auxiliary switch state.
    Aux {
        /// Which switch.
        flag: AuxFlags,
        /// Pressed.
        on: bool,
    },
}

/// Validated axis lookup built from configuration.
#[derive(Debug, Clone, Default)]
pub struct AxisMap {
    axes: HashMap<u16, AxisConfig>,
}

impl AxisMap {
    /// Build the map, rejecting duplicate ids and unusable calibrations.
    pub fn from_config(axes: &[AxisConfig]) -> Result<Self, ConfigError> {
        let mut map = HashMap::with_capacity(axes.len());
        for axis in axes {
            axis.validate()?;
            if map.insert(axis.axis_id, axis.clone()).is_some() {
                return Err(ConfigError::ValidationError(format!(
                    "axis {} configured more than once",
                    axis.axis_id
                )));
            }
        }
        Ok(Self { axes: map })
    }

    /// Calibration for `axis_id`.
    pub fn get(&self, axis_id: u16) -> Option<&AxisConfig> {
        self.axes.get(&axis_id)
    }

    /// Number of configured axes.
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    /// No axes configured.
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }
}

/// Normalize a sample. `None` for an axis that is not configured.
pub fn normalize(sample: &RawSample, axes: &AxisMap) -> Option<CommandField> {
    axes.get(sample.axis_id)
        .map(|axis| scale(sample.raw_value, axis))
}

/// Scale one raw value with a known calibration.
pub fn scale(raw: i32, axis: &AxisConfig) -> CommandField {
    match axis.role {
        AxisRole::Steering => CommandField::Steering(bipolar(raw, axis)),
        AxisRole::Speed => CommandField::Speed(bipolar(raw, axis)),
        AxisRole::Throttle => CommandField::Throttle(unipolar(raw, axis)),
        AxisRole::Brake => CommandField::Brake(unipolar(raw, axis)),
        AxisRole::LedButton => CommandField::Aux {
            flag: AuxFlags::LED,
            on: pressed(raw, axis),
        },
        AxisRole::ShutdownButton => CommandField::Aux {
            flag: AuxFlags::SHUTDOWN,
            on: pressed(raw, axis),
        },
    }
}

fn bipolar(raw: i32, axis: &AxisConfig) -> f32 {
    let raw = i64::from(raw);
    let center = i64::from(axis.effective_center());
    let pct = if raw > center {
        (raw - center) as f32 / (i64::from(axis.max) - center) as f32 * PERCENT_MAX
    } else if raw < center {
        (raw - center) as f32 / (center - i64::from(axis.min)) as f32 * PERCENT_MAX
    } else {
        0.0
    };
    let pct = pct.clamp(SIGNED_PERCENT_MIN, PERCENT_MAX);
    if axis.invert { -pct } else { pct }
}

fn unipolar(raw: i32, axis: &AxisConfig) -> f32 {
    let span = (i64::from(axis.max) - i64::from(axis.min)) as f32;
    let pct = ((i64::from(raw) - i64::from(axis.min)) as f32 / span * PERCENT_MAX)
        .clamp(PERCENT_MIN, PERCENT_MAX);
    if axis.invert { PERCENT_MAX - pct } else { pct }
}

fn pressed(raw: i32, axis: &AxisConfig) -> bool {
    (raw != 0) != axis.invert
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ABS_RZ, ABS_X, ABS_Y, default_axes};

    fn wheel() -> AxisMap {
        AxisMap::from_config(&default_axes()).unwrap()
    }

    fn sample(axis_id: u16, raw_value: i32) -> RawSample {
        RawSample::new(axis_id, raw_value, 0)
    }

    #[test]
    fn steering_two_sided() {
        let axes = wheel();
        assert_eq!(normalize(&sample(ABS_X, 32767), &axes), Some(CommandField::Steering(0.0)));
        assert_eq!(normalize(&sample(ABS_X, 65535), &axes), Some(CommandField::Steering(100.0)));
        assert_eq!(normalize(&sample(ABS_X, 0), &axes), Some(CommandField::Steering(-100.0)));
    }

    #[test]
    fn asymmetric_center_uses_separate_scales() {
        let axis = AxisConfig::new(0, AxisRole::Steering, 0, 1000).with_center(200);
        assert_eq!(scale(100, &axis), CommandField::Steering(-50.0));
        assert_eq!(scale(600, &axis), CommandField::Steering(50.0));
    }

    #[test]
    fn pedals_single_sided() {
        let axes = wheel();
        assert_eq!(normalize(&sample(ABS_RZ, 1023), &axes), Some(CommandField::Throttle(100.0)));
        assert_eq!(normalize(&sample(ABS_Y, 0), &axes), Some(CommandField::Brake(0.0)));
        let Some(CommandField::Brake(b)) = normalize(&sample(ABS_Y, 51), &axes) else {
            panic!("expected brake");
        };
        assert!((b - 20.0).abs() < 1e-4);
    }

    #[test]
    fn out_of_range_is_clamped() {
        let axes = wheel();
        assert_eq!(normalize(&sample(ABS_RZ, 5000), &axes), Some(CommandField::Throttle(100.0)));
        assert_eq!(normalize(&sample(ABS_RZ, -20), &axes), Some(CommandField::Throttle(0.0)));
        assert_eq!(normalize(&sample(ABS_X, 90000), &axes), Some(CommandField::Steering(100.0)));
    }

    #[test]
    fn unknown_axis_is_ignored() {
        assert_eq!(normalize(&sample(42, 100), &wheel()), None);
    }

    #[test]
    fn inverted_speed_stick() {
        let axis = AxisConfig::new(1, AxisRole::Speed, 0, 1024)
            .with_center(512)
            .inverted();
        assert_eq!(scale(0, &axis), CommandField::Speed(100.0));
        assert_eq!(scale(1024, &axis), CommandField::Speed(-100.0));
    }

    #[test]
    fn active_low_button() {
        let axis = AxisConfig::new(6, AxisRole::LedButton, 0, 1).inverted();
        assert_eq!(
            scale(0, &axis),
            CommandField::Aux {
                flag: AuxFlags::LED,
                on: true
            }
        );
        assert_eq!(
            scale(1, &axis),
            CommandField::Aux {
                flag: AuxFlags::LED,
                on: false
            }
        );
    }

    #[test]
    fn duplicate_axis_rejected() {
        let axes = vec![
            AxisConfig::new(0, AxisRole::Throttle, 0, 255),
            AxisConfig::new(0, AxisRole::Brake, 0, 255),
        ];
        assert!(matches!(
            AxisMap::from_config(&axes),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
