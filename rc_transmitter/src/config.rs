//! Transmitter configuration.
//!
//! ```toml
//! [shared]
//! service_name = "rc-transmitter"
//!
//! [send]
//! rate_hz = 50
//! schema = "binary"
//!
//! [transport]
//! kind = "udp"
//! bind = "0.0.0.0:0"
//! peer = "192.168.4.1:5005"
//!
//! [input]
//! source = "stdin"
//!
//! [[axes]]
//! axis_id = 0
//! role = "steering"
//! min = 0
//! center = 32767
//! max = 65535
//! ```
//!
//! Without any `[[axes]]` table the evdev wheel-and-pedals layout is used:
//! `ABS_X` steering, `ABS_RZ` throttle, `ABS_Y` brake.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::Path;
use std::time::Duration;

use rc_common::codec::WireSchema;
use rc_common::config::{ConfigError, ConfigLoader, SharedConfig};
use rc_common::consts::{DEFAULT_TICK_RATE_HZ, DEFAULT_UDP_PORT, TICK_RATE_HZ_MAX, TICK_RATE_HZ_MIN};
use rc_common::transport::{TransportConfig, UdpConfig};
use serde::{Deserialize, Serialize};

use crate::normalize::AxisMap;

// ─── Axes ───────────────────────────────────────────────────────────

/// evdev `ABS_X`.
pub const ABS_X: u16 = 0x00;
/// evdev `ABS_Y`.
pub const ABS_Y: u16 = 0x01;
/// evdev `ABS_RZ`.
pub const ABS_RZ: u16 = 0x05;

/// What an input axis controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisRole {
    /// Bipolar, [-100, 100] %.
    Steering,
    /// Unipolar, [0, 100] %.
    Throttle,
    /// Unipolar, [0, 100] %.
    Brake,
    /// Bipolar: positive side is throttle, negative side is brake.
    Speed,
    /// Digital: LED on while pressed.
    LedButton,
    /// Digital: request vehicle shutdown while pressed.
    ShutdownButton,
}

impl AxisRole {
    /// Scaled around a center point.
    pub const fn is_bipolar(self) -> bool {
        matches!(self, Self::Steering | Self::Speed)
    }

    /// On/off input.
    pub const fn is_button(self) -> bool {
        matches!(self, Self::LedButton | Self::ShutdownButton)
    }
}

/// Calibration for one input axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Device axis or button code.
    pub axis_id: u16,
    /// Field this axis drives.
    pub role: AxisRole,
    /// Raw value at full negative (bipolar) or zero (unipolar).
    #[serde(default)]
    pub min: i32,
    /// Raw rest position of a bipolar axis. Midpoint of min/max if absent.
    #[serde(default)]
    pub center: Option<i32>,
    /// Raw value at full positive deflection.
    #[serde(default = "default_axis_max")]
    pub max: i32,
    /// Reverse the direction (active-low buttons, upside-down sticks).
    #[serde(default)]
    pub invert: bool,
}

fn default_axis_max() -> i32 {
    1023
}

impl AxisConfig {
    /// Axis with the given role and range, no explicit center.
    pub fn new(axis_id: u16, role: AxisRole, min: i32, max: i32) -> Self {
        Self {
            axis_id,
            role,
            min,
            center: None,
            max,
            invert: false,
        }
    }

    /// Set the rest position.
    #[must_use]
    pub fn with_center(mut self, center: i32) -> Self {
        self.center = Some(center);
        self
    }

    /// Reverse the direction.
    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Configured center, or the midpoint of the range.
    pub fn effective_center(&self) -> i32 {
        self.center
            .unwrap_or_else(|| ((i64::from(self.min) + i64::from(self.max)) / 2) as i32)
    }

    /// Reject calibrations that cannot be scaled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.role.is_button() {
            return Ok(());
        }
        if self.max <= self.min {
            return Err(ConfigError::ValidationError(format!(
                "axis {}: max ({}) must exceed min ({})",
                self.axis_id, self.max, self.min
            )));
        }
        if self.role.is_bipolar() {
            let center = self.effective_center();
            if !(self.min < center && center < self.max) {
                return Err(ConfigError::ValidationError(format!(
                    "axis {}: center ({center}) must lie strictly between min ({}) and max ({})",
                    self.axis_id, self.min, self.max
                )));
            }
        }
        Ok(())
    }
}

/// Thrustmaster-style wheel and pedals as reported by evdev.
pub fn default_axes() -> Vec<AxisConfig> {
    vec![
        AxisConfig::new(ABS_X, AxisRole::Steering, 0, 65535).with_center(32767),
        AxisConfig::new(ABS_RZ, AxisRole::Throttle, 0, 1023),
        AxisConfig::new(ABS_Y, AxisRole::Brake, 0, 255),
    ]
}

// ─── Send Loop ──────────────────────────────────────────────────────

/// Send loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    /// Commands per second, 10..=100.
    pub rate_hz: u32,
    /// Wire schema for outgoing packets.
    pub schema: WireSchema,
    /// Neutral commands sent on exit.
    pub neutral_repeats_on_exit: u32,
    /// Log send statistics every N ticks (0 = never).
    pub stats_interval_ticks: u64,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            rate_hz: DEFAULT_TICK_RATE_HZ,
            schema: WireSchema::Binary,
            neutral_repeats_on_exit: 5,
            stats_interval_ticks: 500,
        }
    }
}

impl SendConfig {
    /// Interval between sends.
    pub fn period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.rate_hz.max(1)))
    }

    /// Validate the rate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(TICK_RATE_HZ_MIN..=TICK_RATE_HZ_MAX).contains(&self.rate_hz) {
            return Err(ConfigError::ValidationError(format!(
                "send.rate_hz must be in [{TICK_RATE_HZ_MIN}, {TICK_RATE_HZ_MAX}], got {}",
                self.rate_hz
            )));
        }
        Ok(())
    }
}

// ─── Input ──────────────────────────────────────────────────────────

/// Where raw samples come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// `axis_id value` lines on standard input.
    #[default]
    Stdin,
    /// Generated sweep over every configured axis.
    Simulated,
}

/// Input source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Source kind.
    pub source: InputKind,
    /// Interval between simulated samples [ms].
    pub sample_interval_ms: u64,
    /// Full sweep period of the simulated sticks [ms].
    pub sweep_period_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            source: InputKind::Stdin,
            sample_interval_ms: 10,
            sweep_period_ms: 4000,
        }
    }
}

// ─── Top Level ──────────────────────────────────────────────────────

fn default_transport() -> TransportConfig {
    let receiver = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_UDP_PORT));
    TransportConfig::Udp(UdpConfig::sender(receiver))
}

/// Complete transmitter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmitterConfig {
    /// Service name and log level.
    pub shared: SharedConfig,
    /// Send loop.
    #[serde(default)]
    pub send: SendConfig,
    /// Where commands go.
    #[serde(default = "default_transport")]
    pub transport: TransportConfig,
    /// Where samples come from.
    #[serde(default)]
    pub input: InputConfig,
    /// Axis calibrations.
    #[serde(default = "default_axes")]
    pub axes: Vec<AxisConfig>,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::named("rc-transmitter"),
            send: SendConfig::default(),
            transport: default_transport(),
            input: InputConfig::default(),
            axes: default_axes(),
        }
    }
}

impl TransmitterConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.send.validate()?;
        self.transport.validate()?;
        if matches!(&self.transport, TransportConfig::Udp(udp) if udp.peer.is_none()) {
            return Err(ConfigError::ValidationError(
                "transport.peer is required on the transmitter".to_string(),
            ));
        }
        AxisMap::from_config(&self.axes).map(|_| ())
    }
}

/// Load and validate the transmitter configuration.
pub fn load_config(path: &Path) -> Result<TransmitterConfig, ConfigError> {
    let config = TransmitterConfig::load(path)?;
    config.validate()?;
    Ok(config)
}
