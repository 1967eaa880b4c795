//! Fixed-rate command sender.
//!
//! Every tick: snapshot the shared command, encode it with the configured
//! schema, send. A failed send is logged (first failure, then every 100th)
//! and the next tick simply tries again with a fresher command. On exit a
//! few neutral commands go out so the vehicle stops without waiting for its
//! link timeout.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rc_common::codec::{WireSchema, encode_as};
use rc_common::command::ControlCommand;
use rc_common::transport::{Transport, TransportError};
use tracing::{debug, info, warn};

use crate::command_cell::SharedCommand;
use crate::config::SendConfig;

/// Send counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Payloads accepted by the transport.
    pub sent: u64,
    /// Payloads the transport rejected.
    pub failed: u64,
    /// Neutral payloads sent on exit.
    pub neutral_sent: u64,
}

/// Owns the transport and sends the shared command at a fixed rate.
pub struct CommandSender {
    transport: Box<dyn Transport>,
    command: SharedCommand,
    schema: WireSchema,
    period: Duration,
    neutral_repeats: u32,
    stats_interval_ticks: u64,
    running: Arc<AtomicBool>,
    stats: SendStats,
}

impl CommandSender {
    /// Sender at `config.rate_hz` over `transport`, reading `command`.
    pub fn new(config: &SendConfig, transport: Box<dyn Transport>, command: SharedCommand) -> Self {
        info!(
            transport = transport.name(),
            rate_hz = config.rate_hz,
            schema = ?config.schema,
            "Command sender ready"
        );
        Self {
            transport,
            command,
            schema: config.schema,
            period: config.period(),
            neutral_repeats: config.neutral_repeats_on_exit,
            stats_interval_ticks: config.stats_interval_ticks,
            running: Arc::new(AtomicBool::new(true)),
            stats: SendStats::default(),
        }
    }

    /// Flag that keeps the loop running. Clear it to stop.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Encode and send the current command once.
    pub fn send_once(&mut self) -> Result<ControlCommand, TransportError> {
        self.stats.ticks += 1;
        let cmd = self.command.snapshot();
        let payload = encode_as(&cmd, self.schema);
        match self.transport.send(&payload) {
            Ok(()) => {
                self.stats.sent += 1;
                Ok(cmd)
            }
            Err(e) => {
                self.stats.failed += 1;
                if self.stats.failed == 1 || self.stats.failed % 100 == 0 {
                    warn!(failed = self.stats.failed, "{e}");
                }
                Err(e)
            }
        }
    }

    /// Send neutral `neutral_repeats_on_exit` times, ignoring failures.
    pub fn stop_vehicle(&mut self) {
        let payload = encode_as(&ControlCommand::NEUTRAL, self.schema);
        for _ in 0..self.neutral_repeats {
            match self.transport.send(&payload) {
                Ok(()) => self.stats.neutral_sent += 1,
                Err(e) => debug!("Neutral send failed: {e}"),
            }
        }
        info!(sent = self.stats.neutral_sent, "Stop command sent");
    }

    /// Send until the running flag clears, then stop the vehicle.
    pub fn run(&mut self) {
        self.run_loop(None);
    }

    /// Send at most `ticks` times, then stop the vehicle.
    pub fn run_for(&mut self, ticks: u64) {
        self.run_loop(Some(ticks));
    }

    fn run_loop(&mut self, limit: Option<u64>) {
        let mut next_wake = Instant::now();
        let mut executed = 0u64;

        while self.running.load(Ordering::SeqCst) && limit.is_none_or(|n| executed < n) {
            next_wake += self.period;
            // Failures are counted and logged inside; the next tick retries.
            let _ = self.send_once();
            executed += 1;

            if self.stats_interval_ticks > 0 && self.stats.ticks % self.stats_interval_ticks == 0 {
                debug!(
                    ticks = self.stats.ticks,
                    sent = self.stats.sent,
                    failed = self.stats.failed,
                    "Send stats"
                );
            }

            let now = Instant::now();
            match next_wake.checked_duration_since(now) {
                Some(remaining) => thread::sleep(remaining),
                None => next_wake = now,
            }
        }
        self.stop_vehicle();
    }

    /// Send counters.
    pub fn stats(&self) -> SendStats {
        self.stats
    }
}
