//! Transmitter error type.

use rc_common::config::ConfigError;
use rc_common::transport::TransportError;
use thiserror::Error;

use crate::input::InputError;

/// Errors that stop the transmitter.
#[derive(Debug, Error)]
pub enum TransmitterError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport could not be opened.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Input source failed.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Sampling thread could not be started.
    #[error("Failed to spawn input thread: {0}")]
    Spawn(String),
}
