//! Receiver configuration.
//!
//! One TOML file, every section optional except `[shared]`:
//!
//! ```toml
//! [shared]
//! service_name = "rc-receiver"
//! log_level = "info"
//!
//! [control]
//! tick_rate_hz = 50
//! link_timeout_ms = 500
//! honor_shutdown_request = false
//!
//! [deadband]
//! steering = { zero_point = 0.0, threshold = 5.0 }
//! brake = { zero_point = 0.0, threshold = 5.0 }
//!
//! [transport]
//! kind = "udp"
//! bind = "0.0.0.0:5005"
//!
//! [actuator]
//! driver = "simulation"
//! ```

use std::path::Path;
use std::time::Duration;

use rc_common::config::{ConfigError, ConfigLoader, SharedConfig};
use rc_common::consts::{
    DEFAULT_LINK_TIMEOUT_MS, DEFAULT_TICK_RATE_HZ, TICK_RATE_HZ_MAX, TICK_RATE_HZ_MIN,
};
use rc_common::transport::TransportConfig;
use serde::{Deserialize, Serialize};

use crate::actuator::ActuatorConfig;
use crate::deadband::Deadband;

/// Control loop timing and policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Tick rate [Hz], 10..=100.
    pub tick_rate_hz: u32,
    /// Failsafe after this long without a valid command [ms].
    pub link_timeout_ms: u64,
    /// Stop the loop when a command carries the shutdown request.
    pub honor_shutdown_request: bool,
    /// Log pipeline statistics every N ticks (0 = never).
    pub stats_interval_ticks: u64,
    /// Payloads drained from the transport per tick. Anything left waits
    /// for the next tick.
    pub max_packets_per_tick: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            link_timeout_ms: DEFAULT_LINK_TIMEOUT_MS,
            honor_shutdown_request: false,
            stats_interval_ticks: 500,
            max_packets_per_tick: 64,
        }
    }
}

impl ControlConfig {
    /// Tick period.
    pub fn tick_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_rate_hz.max(1)))
    }

    /// Watchdog interval.
    pub fn link_timeout(&self) -> Duration {
        Duration::from_millis(self.link_timeout_ms)
    }

    /// Validate timing bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(TICK_RATE_HZ_MIN..=TICK_RATE_HZ_MAX).contains(&self.tick_rate_hz) {
            return Err(ConfigError::ValidationError(format!(
                "control.tick_rate_hz must be in [{TICK_RATE_HZ_MIN}, {TICK_RATE_HZ_MAX}], got {}",
                self.tick_rate_hz
            )));
        }
        if self.link_timeout() <= self.tick_period() {
            return Err(ConfigError::ValidationError(format!(
                "control.link_timeout_ms ({}) must exceed one tick ({} ms)",
                self.link_timeout_ms,
                self.tick_period().as_millis()
            )));
        }
        if self.max_packets_per_tick == 0 {
            return Err(ConfigError::ValidationError(
                "control.max_packets_per_tick must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete receiver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Service name and log level.
    pub shared: SharedConfig,
    /// Loop timing.
    #[serde(default)]
    pub control: ControlConfig,
    /// Per-field deadband.
    #[serde(default)]
    pub deadband: Deadband,
    /// Where commands come from.
    #[serde(default)]
    pub transport: TransportConfig,
    /// Output stage.
    #[serde(default)]
    pub actuator: ActuatorConfig,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::named("rc-receiver"),
            control: ControlConfig::default(),
            deadband: Deadband::default(),
            transport: TransportConfig::default(),
            actuator: ActuatorConfig::default(),
        }
    }
}

impl ReceiverConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.control.validate()?;
        self.deadband.validate()?;
        self.transport.validate()?;
        self.actuator.validate()
    }
}

/// Load and validate the receiver configuration.
pub fn load_config(path: &Path) -> Result<ReceiverConfig, ConfigError> {
    let config = ReceiverConfig::load(path)?;
    config.validate()?;
    Ok(config)
}
