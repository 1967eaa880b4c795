//! System-wide constants for the RC link workspace.
//!
//! Single source of truth for value ranges, wire sizes and defaults.
//! Imported by all crates.

/// Lower bound of throttle and brake [%].
pub const PERCENT_MIN: f32 = 0.0;

/// Upper bound of throttle, brake, drive speed and steering magnitude [%].
pub const PERCENT_MAX: f32 = 100.0;

/// Lower bound of steering and drive speed [%].
pub const SIGNED_PERCENT_MIN: f32 = -100.0;

/// Default UDP port the receiver listens on.
pub const DEFAULT_UDP_PORT: u16 = 5005;

/// Largest payload a packet radio frame can carry [bytes].
pub const RADIO_MAX_PAYLOAD: usize = 32;

/// Receive buffer for one UDP datagram [bytes].
///
/// Covers the largest IPv4 and IPv6 datagram payloads, so nothing is
/// truncated before the codec sees it.
pub const MAX_DATAGRAM_LEN: usize = u16::MAX as usize;

/// Default radio channel.
pub const DEFAULT_RADIO_CHANNEL: u8 = 0x60;

/// Default radio pipe address.
pub const DEFAULT_RADIO_ADDRESS: [u8; 5] = [0xE7, 0xE7, 0xE7, 0xE7, 0xE7];

/// Default control tick rate [Hz].
pub const DEFAULT_TICK_RATE_HZ: u32 = 50;

/// Slowest accepted control tick rate [Hz].
pub const TICK_RATE_HZ_MIN: u32 = 10;

/// Fastest accepted control tick rate [Hz].
pub const TICK_RATE_HZ_MAX: u32 = 100;

/// Default liveness timeout before failsafe [ms].
pub const DEFAULT_LINK_TIMEOUT_MS: u64 = 500;

/// Default path of the receiver configuration file.
pub const DEFAULT_RECEIVER_CONFIG: &str = "config/receiver.toml";

/// Default path of the transmitter configuration file.
pub const DEFAULT_TRANSMITTER_CONFIG: &str = "config/transmitter.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(TICK_RATE_HZ_MIN <= DEFAULT_TICK_RATE_HZ);
        assert!(DEFAULT_TICK_RATE_HZ <= TICK_RATE_HZ_MAX);
        assert!(RADIO_MAX_PAYLOAD <= MAX_DATAGRAM_LEN);
        assert_eq!(SIGNED_PERCENT_MIN, -PERCENT_MAX);
    }

    #[test]
    fn link_timeout_spans_several_ticks() {
        let tick_ms = 1000 / DEFAULT_TICK_RATE_HZ as u64;
        assert!(DEFAULT_LINK_TIMEOUT_MS > tick_ms * 2);
    }
}
