//! Generated stick movement for bench runs without hardware.
//!
//! Each configured axis follows a triangle wave across its calibrated range,
//! phase-shifted per axis. Buttons toggle every half period.

use std::thread;
use std::time::{Duration, Instant};

use rc_common::command::RawSample;

use super::{InputError, InputSource};
use crate::config::AxisConfig;

/// Sweeping source over a set of axes.
pub struct SimulatedInput {
    axes: Vec<AxisConfig>,
    interval: Duration,
    period: Duration,
    started: Instant,
    next: usize,
}

impl SimulatedInput {
    /// One sample every `interval`, cycling through `axes`.
    pub fn new(axes: &[AxisConfig], interval: Duration, period: Duration) -> Self {
        Self {
            axes: axes.to_vec(),
            interval,
            period: period.max(Duration::from_millis(1)),
            started: Instant::now(),
            next: 0,
        }
    }
}

/// Triangle wave in [0, 1] at `phase` ∈ [0, 1).
fn triangle(phase: f64) -> f64 {
    if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 }
}

/// Raw value for `axis` at `phase` of the sweep.
pub(crate) fn sweep_value(axis: &AxisConfig, phase: f64) -> i32 {
    if axis.role.is_button() {
        let on = phase < 0.5;
        return i32::from(on != axis.invert);
    }
    let (min, max) = (f64::from(axis.min), f64::from(axis.max));
    (min + (max - min) * triangle(phase)).round() as i32
}

impl InputSource for SimulatedInput {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn next_sample(&mut self) -> Result<Option<RawSample>, InputError> {
        if self.axes.is_empty() {
            return Ok(None);
        }
        thread::sleep(self.interval);

        let index = self.next % self.axes.len();
        self.next = self.next.wrapping_add(1);
        let axis = &self.axes[index];

        let elapsed = self.started.elapsed();
        let offset = index as f64 / self.axes.len() as f64;
        let phase = (elapsed.as_secs_f64() / self.period.as_secs_f64() + offset).fract();
        let timestamp_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

        Ok(Some(RawSample::new(
            axis.axis_id,
            sweep_value(axis, phase),
            timestamp_us,
        )))
    }
}
