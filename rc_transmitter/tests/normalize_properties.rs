//! Normalizer properties over arbitrary raw values and calibrations.

use proptest::prelude::*;
use rc_common::command::RawSample;
use rc_transmitter::config::{AxisConfig, AxisRole};
use rc_transmitter::normalize::{AxisMap, CommandField, normalize, scale};

fn bipolar_axis() -> impl Strategy<Value = AxisConfig> {
    (-100_000i32..0, 1i32..100_000, 1i32..100_000).prop_map(|(min, up, span)| {
        let center = min + span;
        AxisConfig::new(0, AxisRole::Steering, min, center + up).with_center(center)
    })
}

proptest! {
    #[test]
    fn steering_stays_in_bounds(axis in bipolar_axis(), raw in any::<i32>()) {
        let CommandField::Steering(v) = scale(raw, &axis) else {
            panic!("steering axis produced another field");
        };
        prop_assert!((-100.0..=100.0).contains(&v));
    }

    #[test]
    fn center_reads_zero(axis in bipolar_axis()) {
        let center = axis.center.unwrap();
        prop_assert_eq!(scale(center, &axis), CommandField::Steering(0.0));
    }

    #[test]
    fn steering_is_monotonic(axis in bipolar_axis(), a in any::<i32>(), b in any::<i32>()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (CommandField::Steering(x), CommandField::Steering(y)) =
            (scale(lo, &axis), scale(hi, &axis)) else {
            panic!("steering axis produced another field");
        };
        prop_assert!(x <= y);
    }

    #[test]
    fn pedals_stay_in_bounds(max in 1i32..1_000_000, raw in any::<i32>()) {
        let axis = AxisConfig::new(5, AxisRole::Throttle, 0, max);
        let CommandField::Throttle(v) = scale(raw, &axis) else {
            panic!("throttle axis produced another field");
        };
        prop_assert!((0.0..=100.0).contains(&v));
    }

    #[test]
    fn unmapped_axes_ignored(id in 1u16.., raw in any::<i32>()) {
        let axes = AxisMap::from_config(&[AxisConfig::new(0, AxisRole::Brake, 0, 255)]).unwrap();
        prop_assert_eq!(normalize(&RawSample::new(id, raw, 0), &axes), None);
    }
}
