//! Scoped actuator ownership.
//!
//! The guard is the only owner of the driver. Dropping it, on a normal
//! return, an early `?` or a panic unwinding through the loop, drives the
//! motors to zero, centers the steering, switches every auxiliary output off
//! and releases the driver.

use tracing::{info, warn};

use super::{Actuator, ActuatorConfig, ActuatorError, ActuatorRegistry, AuxOutput, apply_target};
use crate::pipeline::ActuatorTarget;

/// Owns an acquired actuator for the lifetime of the control loop.
pub struct ActuatorGuard {
    actuator: Box<dyn Actuator>,
}

impl ActuatorGuard {
    /// Acquire `actuator` and put it in the neutral state.
    ///
    /// # Errors
    /// Any acquisition error. Nothing has been written when this fails.
    pub fn acquire(
        mut actuator: Box<dyn Actuator>,
        config: &ActuatorConfig,
    ) -> Result<Self, ActuatorError> {
        actuator.acquire(config)?;
        info!(driver = actuator.name(), "Actuator acquired");

        let mut guard = Self { actuator };
        if let Err(e) = guard.apply(&ActuatorTarget::NEUTRAL) {
            warn!("Initial neutral write failed: {e}");
        }
        Ok(guard)
    }

    /// Look up `config.driver` in `registry` and acquire it.
    ///
    /// # Errors
    /// `DriverNotFound` for an unknown driver, or the acquisition error.
    pub fn from_registry(
        registry: &ActuatorRegistry,
        config: &ActuatorConfig,
    ) -> Result<Self, ActuatorError> {
        let actuator = registry.create(&config.driver)?;
        Self::acquire(actuator, config)
    }

    /// Driver name.
    pub fn name(&self) -> &'static str {
        self.actuator.name()
    }

    /// Write a full target.
    pub fn apply(&mut self, target: &ActuatorTarget) -> Result<(), ActuatorError> {
        apply_target(self.actuator.as_mut(), target)
    }

    fn teardown(&mut self) {
        if let Err(e) = self.actuator.set_drive(0.0) {
            warn!("Teardown: drive to zero failed: {e}");
        }
        if let Err(e) = self.actuator.set_steering(0.0) {
            warn!("Teardown: steering to center failed: {e}");
        }
        for output in AuxOutput::ALL {
            if let Err(e) = self.actuator.set_auxiliary(output, false) {
                warn!("Teardown: {output:?} off failed: {e}");
            }
        }
        self.actuator.release();
        info!(driver = self.actuator.name(), "Actuator released");
    }
}

impl Drop for ActuatorGuard {
    fn drop(&mut self) {
        self.teardown();
    }
}
