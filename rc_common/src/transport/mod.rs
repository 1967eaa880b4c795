//! Transport adapters for command packets.
//!
//! Every transport moves opaque payloads; the codec gives them meaning.
//! Nothing here assumes ordering or delivery.
//!
//! - [`DatagramChannel`] - UDP socket, non-blocking
//! - [`PacketRadioChannel`] - wraps a [`RadioLink`] hardware driver
//! - [`LoopbackRadio`] - in-memory radio for simulation and tests
//!
//! Receivers build a transport from TOML with [`open_transport`]:
//!
//! ```toml
//! [transport]
//! kind = "udp"
//! bind = "0.0.0.0:5005"
//! ```

mod datagram;
mod loopback;
mod radio;

pub use datagram::DatagramChannel;
pub use loopback::{LoopbackHandle, LoopbackRadio};
pub use radio::{PacketRadioChannel, RadioFactory, RadioLink, RadioRegistry};

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::consts::{DEFAULT_RADIO_ADDRESS, DEFAULT_RADIO_CHANNEL, DEFAULT_UDP_PORT, RADIO_MAX_PAYLOAD};

/// One received payload, exactly as it arrived.
pub type Payload = Vec<u8>;

/// One radio frame. Fixed capacity, no heap allocation in the driver.
pub type RadioFrame = heapless::Vec<u8, RADIO_MAX_PAYLOAD>;

/// Copy bytes into a [`RadioFrame`], `None` if they do not fit.
pub fn radio_frame(bytes: &[u8]) -> Option<RadioFrame> {
    RadioFrame::from_slice(bytes).ok()
}

/// Transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Socket bind or radio initialization failed.
    #[error("Failed to open transport: {0}")]
    OpenFailed(String),

    /// Payload was not delivered (socket error or missing acknowledgment).
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Payload exceeds what the medium can carry.
    #[error("Payload of {len} bytes exceeds the {max}-byte limit")]
    PayloadTooLarge {
        /// Offered payload length.
        len: usize,
        /// Medium limit.
        max: usize,
    },

    /// No radio driver registered under that name.
    #[error("Radio driver not found: {0}")]
    DriverNotFound(String),
}

/// Packet transport shared by both ends of the link.
pub trait Transport: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Send one payload.
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Non-blocking poll for the oldest queued payload. `None` when nothing
    /// is waiting.
    fn try_receive(&mut self) -> Option<Payload>;
}

// ─── Configuration ──────────────────────────────────────────────────

/// Transport selection, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportConfig {
    /// UDP datagrams.
    Udp(UdpConfig),
    /// Packet radio.
    Radio(RadioConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Udp(UdpConfig::default())
    }
}

impl TransportConfig {
    /// Validate the selected variant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Udp(_) => Ok(()),
            Self::Radio(radio) => radio.validate(),
        }
    }
}

/// UDP transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UdpConfig {
    /// Local address. Receivers listen on all interfaces, port 5005.
    pub bind: SocketAddr,
    /// Destination for `send`. Required on the transmitter.
    pub peer: Option<SocketAddr>,
    /// Allow sending to a broadcast address.
    pub broadcast: bool,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_UDP_PORT)),
            peer: None,
            broadcast: false,
        }
    }
}

impl UdpConfig {
    /// Sender-side settings: ephemeral local port, fixed peer.
    pub fn sender(peer: SocketAddr) -> Self {
        Self {
            bind: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
            peer: Some(peer),
            ..Self::default()
        }
    }
}

/// Highest radio channel number.
pub const RADIO_CHANNEL_MAX: u8 = 125;

/// Highest auto-retransmit count and delay step.
pub const RADIO_RETRY_MAX: u8 = 15;

/// Packet radio settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Registered driver name.
    pub driver: String,
    /// RF channel, 0..=125.
    pub channel: u8,
    /// Pipe address shared by both ends.
    pub address: [u8; 5],
    /// Auto-retransmit count, 0..=15.
    pub retries: u8,
    /// Auto-retransmit delay step, 0..=15.
    pub retry_delay: u8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            driver: "loopback".to_string(),
            channel: DEFAULT_RADIO_CHANNEL,
            address: DEFAULT_RADIO_ADDRESS,
            retries: RADIO_RETRY_MAX,
            retry_delay: RADIO_RETRY_MAX,
        }
    }
}

impl RadioConfig {
    /// Validate the radio settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` on an empty driver name or
    /// out-of-range channel / retry values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "transport.driver cannot be empty".to_string(),
            ));
        }
        if self.channel > RADIO_CHANNEL_MAX {
            return Err(ConfigError::ValidationError(format!(
                "transport.channel {} exceeds {RADIO_CHANNEL_MAX}",
                self.channel
            )));
        }
        if self.retries > RADIO_RETRY_MAX || self.retry_delay > RADIO_RETRY_MAX {
            return Err(ConfigError::ValidationError(format!(
                "transport.retries / retry_delay must be <= {RADIO_RETRY_MAX}"
            )));
        }
        Ok(())
    }
}

/// Open the configured transport.
///
/// # Errors
///
/// `OpenFailed` if the socket cannot be bound or the radio cannot be
/// configured, `DriverNotFound` for an unknown radio driver.
pub fn open_transport(
    config: &TransportConfig,
    radios: &RadioRegistry,
) -> Result<Box<dyn Transport>, TransportError> {
    match config {
        TransportConfig::Udp(udp) => Ok(Box::new(DatagramChannel::open(udp)?)),
        TransportConfig::Radio(radio) => {
            let link = radios.create_link(&radio.driver)?;
            Ok(Box::new(PacketRadioChannel::open(link, radio)?))
        }
    }
}
