//! Receiver error type.
//!
//! Everything here is a startup failure. Once the loop runs, decode and
//! write errors are counted and logged instead of returned.

use rc_common::config::ConfigError;
use rc_common::transport::TransportError;
use thiserror::Error;

use crate::actuator::ActuatorError;

/// Errors that stop the receiver.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport could not be opened.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Actuator could not be acquired.
    #[error(transparent)]
    Actuator(#[from] ActuatorError),

    /// Real-time setup system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),
}
