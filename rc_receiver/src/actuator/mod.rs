//! Actuator interface, driver registry and configuration.
//!
//! Drivers are pluggable through [`ActuatorRegistry`]. The loop never talks
//! to a driver directly: it goes through [`ActuatorGuard`], which owns the
//! driver and drives everything to zero on the way out.
//!
//! # Lifecycle
//!
//! 1. `acquire()` - once at startup; failure is fatal
//! 2. `set_drive()` / `set_steering()` / `set_auxiliary()` - every tick
//! 3. `release()` - once, from the guard's teardown

mod guard;
mod simulation;

pub use guard::ActuatorGuard;
pub use simulation::{SimulatedActuator, SimulationProbe, SimulationSnapshot};

use std::collections::HashMap;

use rc_common::config::ConfigError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::output::ServoGeometry;
use crate::pipeline::ActuatorTarget;

/// Actuator errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    /// Driver could not claim its outputs.
    #[error("Actuator acquisition failed: {0}")]
    AcquireFailed(String),

    /// A single output write failed.
    #[error("Actuator write failed: {0}")]
    WriteFailed(String),

    /// No driver registered under that name.
    #[error("Actuator driver not found: {0}")]
    DriverNotFound(String),
}

/// Auxiliary on/off outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AuxOutput {
    /// Headlight / status LED.
    Led = 0,
}

impl AuxOutput {
    /// Every auxiliary output, for teardown.
    pub const ALL: [Self; 1] = [Self::Led];
}

/// Output stage driver.
pub trait Actuator: Send {
    /// Driver name.
    fn name(&self) -> &'static str;

    /// Claim the outputs.
    fn acquire(&mut self, config: &ActuatorConfig) -> Result<(), ActuatorError>;

    /// Drive motors, signed speed [-100, 100] %.
    fn set_drive(&mut self, speed_percent: f32) -> Result<(), ActuatorError>;

    /// Steering servo, [-100, 100] % of full lock.
    fn set_steering(&mut self, angle_percent: f32) -> Result<(), ActuatorError>;

    /// Switch an auxiliary output.
    fn set_auxiliary(&mut self, output: AuxOutput, on: bool) -> Result<(), ActuatorError>;

    /// Free the outputs. Called once, after everything was driven to zero.
    fn release(&mut self);
}

/// Write a whole target. Every output is attempted; the first error wins.
pub fn apply_target(
    actuator: &mut dyn Actuator,
    target: &ActuatorTarget,
) -> Result<(), ActuatorError> {
    let drive = actuator.set_drive(target.drive_speed_percent());
    let steering = actuator.set_steering(target.steering_percent());
    let led = actuator.set_auxiliary(AuxOutput::Led, target.led());
    drive.and(steering).and(led)
}

// ─── Registry ───────────────────────────────────────────────────────

/// Factory function type for actuator drivers.
pub type ActuatorFactory = fn() -> Box<dyn Actuator>;

/// Registry of available actuator drivers.
///
/// Constructed at startup, populated via `register()`, no global state.
pub struct ActuatorRegistry {
    factories: HashMap<&'static str, ActuatorFactory>,
}

fn create_simulation() -> Box<dyn Actuator> {
    Box::new(SimulatedActuator::new())
}

impl ActuatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the built-in `simulation` driver.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("simulation", create_simulation);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: ActuatorFactory) {
        if self.factories.contains_key(name) {
            panic!("Actuator driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Create a driver instance by name.
    ///
    /// # Errors
    /// Returns `ActuatorError::DriverNotFound` for an unknown name.
    pub fn create(&self, name: &str) -> Result<Box<dyn Actuator>, ActuatorError> {
        let factory = self
            .factories
            .get(name)
            .copied()
            .ok_or_else(|| ActuatorError::DriverNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// List all registered driver names.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for ActuatorRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

// ─── Configuration ──────────────────────────────────────────────────

/// Output stage settings.
///
/// ```toml
/// [actuator]
/// driver = "simulation"
/// pwm_frequency_hz = 100
/// servo_min_pulse_us = 630
/// servo_max_pulse_us = 1330
/// servo_frame_hz = 50
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Registered driver name.
    pub driver: String,
    /// Motor H-bridge PWM frequency [Hz].
    pub pwm_frequency_hz: u32,
    /// Servo pulse at full left [µs].
    pub servo_min_pulse_us: u32,
    /// Servo pulse at full right [µs].
    pub servo_max_pulse_us: u32,
    /// Servo frame rate [Hz].
    pub servo_frame_hz: u32,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            driver: "simulation".to_string(),
            pwm_frequency_hz: 100,
            servo_min_pulse_us: 630,
            servo_max_pulse_us: 1330,
            servo_frame_hz: 50,
        }
    }
}

impl ActuatorConfig {
    /// Servo geometry for signal computation.
    pub fn servo_geometry(&self) -> ServoGeometry {
        ServoGeometry {
            min_pulse_us: self.servo_min_pulse_us as f32,
            max_pulse_us: self.servo_max_pulse_us as f32,
            frame_hz: self.servo_frame_hz as f32,
        }
    }

    /// Validate the output stage settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "actuator.driver cannot be empty".to_string(),
            ));
        }
        if self.pwm_frequency_hz == 0 {
            return Err(ConfigError::ValidationError(
                "actuator.pwm_frequency_hz must be > 0".to_string(),
            ));
        }
        if self.servo_frame_hz == 0 {
            return Err(ConfigError::ValidationError(
                "actuator.servo_frame_hz must be > 0".to_string(),
            ));
        }
        if self.servo_min_pulse_us >= self.servo_max_pulse_us {
            return Err(ConfigError::ValidationError(format!(
                "actuator.servo_min_pulse_us ({}) must be < servo_max_pulse_us ({})",
                self.servo_min_pulse_us, self.servo_max_pulse_us
            )));
        }
        let period_us = 1_000_000 / self.servo_frame_hz;
        if self.servo_max_pulse_us >= period_us {
            return Err(ConfigError::ValidationError(format!(
                "actuator.servo_max_pulse_us ({}) must fit in the {period_us} µs servo frame",
                self.servo_max_pulse_us
            )));
        }
        Ok(())
    }
}
