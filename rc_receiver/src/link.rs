//! Link liveness watchdog.
//!
//! Counts control ticks since the last valid command. The timeout is
//! configured in milliseconds and converted to ticks once at startup, so
//! the check itself is a single integer compare.

use std::time::Duration;

/// Ticks since the last valid packet, and the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkHealth {
    ticks_since_valid: u32,
    timeout_ticks: u32,
}

impl LinkHealth {
    /// Watchdog with an explicit tick limit.
    pub const fn new(timeout_ticks: u32) -> Self {
        Self {
            ticks_since_valid: 0,
            timeout_ticks,
        }
    }

    /// Watchdog for `timeout` at the given tick period.
    pub fn from_timeout(timeout: Duration, tick_period: Duration) -> Self {
        Self::new(timeout_to_ticks(timeout, tick_period))
    }

    /// A valid command arrived this tick.
    #[inline]
    pub fn record_valid(&mut self) {
        self.ticks_since_valid = 0;
    }

    /// A tick passed without a valid command.
    #[inline]
    pub fn record_silent_tick(&mut self) {
        self.ticks_since_valid = self.ticks_since_valid.saturating_add(1);
    }

    /// Longer than the timeout without a valid command.
    #[inline]
    pub const fn is_expired(&self) -> bool {
        self.ticks_since_valid > self.timeout_ticks
    }

    /// Ticks since the last valid command.
    #[inline]
    pub const fn ticks_since_valid(&self) -> u32 {
        self.ticks_since_valid
    }

    /// Configured limit [ticks].
    #[inline]
    pub const fn timeout_ticks(&self) -> u32 {
        self.timeout_ticks
    }
}

/// `ceil(timeout / tick_period)`, at least one tick.
pub fn timeout_to_ticks(timeout: Duration, tick_period: Duration) -> u32 {
    let period_ns = tick_period.as_nanos().max(1);
    let ticks = timeout.as_nanos().div_ceil(period_ns);
    u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
}
