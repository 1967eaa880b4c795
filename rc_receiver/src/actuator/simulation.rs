//! Simulation actuator.
//!
//! Converts every write to its electrical value and keeps the result in
//! memory. A [`SimulationProbe`] reads that state from another owner, which
//! is how tests and `--simulate` runs observe the outputs.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{Actuator, ActuatorConfig, ActuatorError, AuxOutput};
use crate::output::{DriveSignal, ServoGeometry, ServoSignal};

/// Drive writes kept for inspection.
const HISTORY_CAP: usize = 1024;

/// Observable state of a simulated output stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSnapshot {
    /// `acquire()` succeeded.
    pub acquired: bool,
    /// `release()` was called.
    pub released: bool,
    /// Last drive speed written [%].
    pub drive_speed_percent: f32,
    /// Last steering written [%].
    pub steering_percent: f32,
    /// LED output state.
    pub led: bool,
    /// H-bridge duties for the last drive write.
    pub drive: DriveSignal,
    /// Servo pulse for the last steering write.
    pub servo: ServoSignal,
    /// Successful writes of any kind.
    pub writes: u64,
}

#[derive(Debug)]
struct SimState {
    snapshot: SimulationSnapshot,
    geometry: ServoGeometry,
    drive_history: VecDeque<f32>,
    fail_writes: bool,
}

impl SimState {
    fn check_writable(&self) -> Result<(), ActuatorError> {
        if self.fail_writes {
            return Err(ActuatorError::WriteFailed("injected fault".to_string()));
        }
        if !self.snapshot.acquired || self.snapshot.released {
            return Err(ActuatorError::WriteFailed(
                "outputs not acquired".to_string(),
            ));
        }
        Ok(())
    }
}

/// In-memory output stage.
pub struct SimulatedActuator {
    state: Arc<Mutex<SimState>>,
}

/// Read-side handle onto a [`SimulatedActuator`].
#[derive(Clone)]
pub struct SimulationProbe {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedActuator {
    /// Create an unacquired actuator.
    pub fn new() -> Self {
        let geometry = ServoGeometry::default();
        Self {
            state: Arc::new(Mutex::new(SimState {
                snapshot: SimulationSnapshot {
                    acquired: false,
                    released: false,
                    drive_speed_percent: 0.0,
                    steering_percent: 0.0,
                    led: false,
                    drive: DriveSignal::OFF,
                    servo: ServoSignal::centered(&geometry),
                    writes: 0,
                },
                geometry,
                drive_history: VecDeque::with_capacity(HISTORY_CAP),
                fail_writes: false,
            })),
        }
    }

    /// Handle for observing this actuator.
    pub fn probe(&self) -> SimulationProbe {
        SimulationProbe {
            state: self.state.clone(),
        }
    }
}

impl Default for SimulatedActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuator for SimulatedActuator {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn acquire(&mut self, config: &ActuatorConfig) -> Result<(), ActuatorError> {
        let mut state = self.state.lock();
        if state.snapshot.acquired {
            return Err(ActuatorError::AcquireFailed(
                "outputs already acquired".to_string(),
            ));
        }
        state.geometry = config.servo_geometry();
        state.snapshot.servo = ServoSignal::centered(&state.geometry);
        state.snapshot.acquired = true;
        debug!(
            pwm_hz = config.pwm_frequency_hz,
            servo_min_us = config.servo_min_pulse_us,
            servo_max_us = config.servo_max_pulse_us,
            "Simulated outputs acquired"
        );
        Ok(())
    }

    fn set_drive(&mut self, speed_percent: f32) -> Result<(), ActuatorError> {
        let mut state = self.state.lock();
        state.check_writable()?;
        let signal = DriveSignal::from_speed(speed_percent);
        state.snapshot.drive_speed_percent = speed_percent;
        state.snapshot.drive = signal;
        state.snapshot.writes += 1;
        if state.drive_history.len() == HISTORY_CAP {
            state.drive_history.pop_front();
        }
        state.drive_history.push_back(speed_percent);
        trace!(
            forward = signal.forward_duty_percent,
            reverse = signal.reverse_duty_percent,
            "drive"
        );
        Ok(())
    }

    fn set_steering(&mut self, angle_percent: f32) -> Result<(), ActuatorError> {
        let mut state = self.state.lock();
        state.check_writable()?;
        let signal = ServoSignal::from_steering(angle_percent, &state.geometry);
        state.snapshot.steering_percent = angle_percent;
        state.snapshot.servo = signal;
        state.snapshot.writes += 1;
        trace!(pulse_us = signal.pulse_width_us, "steering");
        Ok(())
    }

    fn set_auxiliary(&mut self, output: AuxOutput, on: bool) -> Result<(), ActuatorError> {
        let mut state = self.state.lock();
        state.check_writable()?;
        match output {
            AuxOutput::Led => state.snapshot.led = on,
        }
        state.snapshot.writes += 1;
        Ok(())
    }

    fn release(&mut self) {
        let mut state = self.state.lock();
        state.snapshot.released = true;
        debug!(writes = state.snapshot.writes, "Simulated outputs released");
    }
}

impl SimulationProbe {
    /// Copy of the current output state.
    pub fn snapshot(&self) -> SimulationSnapshot {
        self.state.lock().snapshot.clone()
    }

    /// Drive speeds written so far, oldest first (bounded).
    pub fn drive_history(&self) -> Vec<f32> {
        self.state.lock().drive_history.iter().copied().collect()
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acquired() -> (SimulatedActuator, SimulationProbe) {
        let mut sim = SimulatedActuator::new();
        let probe = sim.probe();
        sim.acquire(&ActuatorConfig::default()).unwrap();
        (sim, probe)
    }

    #[test]
    fn writes_before_acquire_fail() {
        let mut sim = SimulatedActuator::new();
        assert!(matches!(
            sim.set_drive(10.0),
            Err(ActuatorError::WriteFailed(_))
        ));
    }

    #[test]
    fn double_acquire_fails() {
        let (mut sim, _) = acquired();
        assert!(matches!(
            sim.acquire(&ActuatorConfig::default()),
            Err(ActuatorError::AcquireFailed(_))
        ));
    }

    #[test]
    fn drive_and_servo_signals_recorded() {
        let (mut sim, probe) = acquired();
        sim.set_drive(-30.0).unwrap();
        sim.set_steering(100.0).unwrap();

        let snap = probe.snapshot();
        assert_eq!(snap.drive.reverse_duty_percent, 30.0);
        assert_eq!(snap.drive.forward_duty_percent, 0.0);
        assert_eq!(snap.servo.pulse_width_us, 1330.0);
        assert_eq!(snap.writes, 2);
        assert_eq!(probe.drive_history(), vec![-30.0]);
    }

    #[test]
    fn injected_fault() {
        let (mut sim, probe) = acquired();
        probe.fail_writes(true);
        assert!(sim.set_steering(0.0).is_err());
        probe.fail_writes(false);
        assert!(sim.set_steering(0.0).is_ok());
    }

    #[test]
    fn release_blocks_further_writes() {
        let (mut sim, probe) = acquired();
        sim.release();
        assert!(probe.snapshot().released);
        assert!(sim.set_auxiliary(AuxOutput::Led, true).is_err());
    }
}
