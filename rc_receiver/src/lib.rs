//! # RC Receiver Library
//!
//! Vehicle-side control loop. Each tick drains the transport, decodes
//! whatever arrived, runs the deadband and the link watchdog on the newest
//! valid command, and refreshes the actuator with the resulting target.
//!
//! ## Layers
//!
//! 1. **Codec** (in `rc_common`): bytes to `ControlCommand`
//! 2. **Deadband**: small inputs snapped to their zero point
//! 3. **Link state**: `AwaitingFirstCommand → Active ⇄ Failsafe`
//! 4. **Pipeline**: command + state to `ActuatorTarget`
//! 5. **Actuator**: target to PWM duty and servo pulse
//!
//! ## Safety
//!
//! The actuator is owned by an [`actuator::ActuatorGuard`]. Every exit
//! path, including panics, drives the outputs to neutral and releases them.

#![deny(missing_docs)]

pub mod actuator;
pub mod config;
pub mod cycle;
pub mod deadband;
pub mod error;
pub mod link;
pub mod output;
pub mod pipeline;
pub mod state;
