//! Packet radio channel and driver registry.
//!
//! The radio hardware (an nRF24-class transceiver on SPI in the field) is an
//! external collaborator behind [`RadioLink`]. This module owns the parts
//! that do not depend on the chip: the 32-byte payload limit, mapping a
//! missing acknowledgment to `SendFailed`, and powering the link down when
//! the channel goes away.

use std::collections::HashMap;

use tracing::{debug, info};

use super::{LoopbackRadio, Payload, RadioConfig, RadioFrame, Transport, TransportError};
use crate::consts::RADIO_MAX_PAYLOAD;

/// Hardware driver for a packet radio.
pub trait RadioLink: Send {
    /// Driver name.
    fn name(&self) -> &'static str;

    /// Apply channel, address and retry settings and power up.
    fn configure(&mut self, config: &RadioConfig) -> Result<(), TransportError>;

    /// Transmit one frame. `Ok(false)` means no acknowledgment arrived
    /// after all retries.
    fn transmit(&mut self, frame: &[u8]) -> Result<bool, TransportError>;

    /// Take the oldest received frame, if any. Never blocks.
    fn poll_frame(&mut self) -> Option<RadioFrame>;

    /// Power the transceiver down.
    fn power_down(&mut self);
}

/// Factory function type for radio drivers.
pub type RadioFactory = fn() -> Box<dyn RadioLink>;

/// Registry of available radio drivers.
///
/// Constructed at startup and passed by reference to
/// [`open_transport`](super::open_transport). No global state.
pub struct RadioRegistry {
    factories: HashMap<&'static str, RadioFactory>,
}

impl RadioRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the in-memory `loopback` driver.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("loopback", create_loopback);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: RadioFactory) {
        if self.factories.contains_key(name) {
            panic!("Radio driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Create a driver instance by name.
    ///
    /// # Errors
    /// Returns `TransportError::DriverNotFound` for an unknown name.
    pub fn create_link(&self, name: &str) -> Result<Box<dyn RadioLink>, TransportError> {
        let factory = self
            .factories
            .get(name)
            .copied()
            .ok_or_else(|| TransportError::DriverNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// List all registered driver names.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

fn create_loopback() -> Box<dyn RadioLink> {
    Box::new(LoopbackRadio::self_loop())
}

impl Default for RadioRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Transport over a packet radio link.
pub struct PacketRadioChannel {
    link: Box<dyn RadioLink>,
}

impl PacketRadioChannel {
    /// Configure the link and wrap it.
    ///
    /// # Errors
    /// `OpenFailed` (or the driver's own error) if configuration fails.
    pub fn open(mut link: Box<dyn RadioLink>, config: &RadioConfig) -> Result<Self, TransportError> {
        link.configure(config)?;
        info!(
            driver = link.name(),
            channel = config.channel,
            address = ?config.address,
            "Packet radio open"
        );
        Ok(Self { link })
    }
}

impl Transport for PacketRadioChannel {
    fn name(&self) -> &'static str {
        "radio"
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if payload.len() > RADIO_MAX_PAYLOAD {
            return Err(TransportError::PayloadTooLarge {
                len: payload.len(),
                max: RADIO_MAX_PAYLOAD,
            });
        }
        if self.link.transmit(payload)? {
            Ok(())
        } else {
            Err(TransportError::SendFailed("no acknowledgment".to_string()))
        }
    }

    fn try_receive(&mut self) -> Option<Payload> {
        self.link.poll_frame().map(|frame| frame.to_vec())
    }
}

impl Drop for PacketRadioChannel {
    fn drop(&mut self) {
        debug!(driver = self.link.name(), "Powering radio down");
        self.link.power_down();
    }
}
