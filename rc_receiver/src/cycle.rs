//! Fixed-rate receiver loop: poll → pipeline → actuator → sleep.
//!
//! Each tick drains what the transport has queued, up to a per-tick limit,
//! and hands the batch to the pipeline. The loop paces against an absolute
//! deadline so a slow tick does not shift every later one.
//! Overruns are counted and logged; the loop keeps going.
//!
//! ## RT Setup
//! With the `rt` feature: `mlockall(MCL_CURRENT | MCL_FUTURE)` then
//! `SCHED_FIFO` at the requested priority. Without it, both are no-ops.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rc_common::transport::{Payload, RadioRegistry, Transport, open_transport};
use tracing::{debug, info, trace, warn};

use crate::actuator::{ActuatorGuard, ActuatorRegistry};
use crate::config::ReceiverConfig;
use crate::error::ReceiverError;
use crate::pipeline::{CommandPipeline, TickOutput};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Ticks executed.
    pub tick_count: u64,
    /// Last tick body duration [ns].
    pub last_tick_ns: u64,
    /// Shortest tick body [ns].
    pub min_tick_ns: u64,
    /// Longest tick body [ns].
    pub max_tick_ns: u64,
    /// Running sum for the average.
    pub sum_tick_ns: u64,
    /// Ticks whose body exceeded the period.
    pub overruns: u64,
    /// Actuator writes that failed.
    pub write_errors: u64,
}

impl CycleStats {
    /// Zeroed stats.
    pub const fn new() -> Self {
        Self {
            tick_count: 0,
            last_tick_ns: 0,
            min_tick_ns: u64::MAX,
            max_tick_ns: 0,
            sum_tick_ns: 0,
            overruns: 0,
            write_errors: 0,
        }
    }

    /// Record one tick body duration.
    #[inline]
    pub fn record(&mut self, duration_ns: u64) {
        self.tick_count += 1;
        self.last_tick_ns = duration_ns;
        self.min_tick_ns = self.min_tick_ns.min(duration_ns);
        self.max_tick_ns = self.max_tick_ns.max(duration_ns);
        self.sum_tick_ns = self.sum_tick_ns.saturating_add(duration_ns);
    }

    /// Average tick body [ns], 0 before the first tick.
    #[inline]
    pub fn avg_tick_ns(&self) -> u64 {
        if self.tick_count == 0 {
            0
        } else {
            self.sum_tick_ns / self.tick_count
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The running flag was cleared (Ctrl-C).
    Signal,
    /// A command carried the shutdown request and the config honors it.
    ShutdownRequested,
    /// The requested number of ticks ran.
    TickLimit,
}

// ─── RT Setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), ReceiverError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| ReceiverError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), ReceiverError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), ReceiverError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` is a valid sched_param; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(ReceiverError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), ReceiverError> {
    Ok(())
}

/// Lock memory and switch to `SCHED_FIFO`. No-op without the `rt` feature.
pub fn rt_setup(rt_priority: i32) -> Result<(), ReceiverError> {
    rt_mlockall()?;
    rt_set_scheduler(rt_priority)
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the transport, pipeline and actuator for the lifetime of the loop.
///
/// Dropping the runner drops the [`ActuatorGuard`], which zeroes and
/// releases the outputs.
pub struct CycleRunner {
    transport: Box<dyn Transport>,
    inbox: Vec<Payload>,
    max_packets_per_tick: usize,
    pipeline: CommandPipeline,
    actuator: ActuatorGuard,
    tick_period: Duration,
    honor_shutdown_request: bool,
    stats_interval_ticks: u64,
    running: Arc<AtomicBool>,
    stats: CycleStats,
}

impl CycleRunner {
    /// Assemble a runner from already-open parts.
    pub fn new(
        config: &ReceiverConfig,
        transport: Box<dyn Transport>,
        actuator: ActuatorGuard,
    ) -> Self {
        let tick_period = config.control.tick_period();
        let pipeline =
            CommandPipeline::with_timeout(config.deadband, config.control.link_timeout(), tick_period);
        info!(
            transport = transport.name(),
            actuator = actuator.name(),
            tick_rate_hz = config.control.tick_rate_hz,
            timeout_ticks = pipeline.health().timeout_ticks(),
            "Cycle runner ready"
        );
        let max_packets_per_tick = config.control.max_packets_per_tick.max(1);
        Self {
            transport,
            inbox: Vec::with_capacity(max_packets_per_tick),
            max_packets_per_tick,
            pipeline,
            actuator,
            tick_period,
            honor_shutdown_request: config.control.honor_shutdown_request,
            stats_interval_ticks: config.control.stats_interval_ticks,
            running: Arc::new(AtomicBool::new(true)),
            stats: CycleStats::new(),
        }
    }

    /// Open the configured transport and acquire the configured actuator.
    ///
    /// # Errors
    /// Transport open failure, unknown actuator driver or failed acquisition.
    /// No output has been written when this fails.
    pub fn from_config(
        config: &ReceiverConfig,
        radios: &RadioRegistry,
        actuators: &ActuatorRegistry,
    ) -> Result<Self, ReceiverError> {
        let transport = open_transport(&config.transport, radios)?;
        let actuator = ActuatorGuard::from_registry(actuators, &config.actuator)?;
        Ok(Self::new(config, transport, actuator))
    }

    /// Flag that keeps the loop running. Clear it to stop.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// One tick body: drain, pipeline, actuator refresh.
    pub fn tick(&mut self) -> TickOutput {
        self.inbox.clear();
        while self.inbox.len() < self.max_packets_per_tick {
            match self.transport.try_receive() {
                Some(payload) => self.inbox.push(payload),
                None => break,
            }
        }
        let out = self
            .pipeline
            .tick_batch(self.inbox.iter().map(Vec::as_slice));

        if let Err(e) = self.actuator.apply(&out.target) {
            self.stats.write_errors += 1;
            if self.stats.write_errors == 1 || self.stats.write_errors % 100 == 0 {
                warn!(count = self.stats.write_errors, "Actuator write failed: {e}");
            }
        }
        out
    }

    /// Run until the running flag clears or a shutdown request is honored.
    pub fn run(&mut self) -> StopReason {
        self.run_loop(None)
    }

    /// Run at most `ticks` ticks.
    pub fn run_for(&mut self, ticks: u64) -> StopReason {
        self.run_loop(Some(ticks))
    }

    fn run_loop(&mut self, limit: Option<u64>) -> StopReason {
        let budget_ns = self.tick_period.as_nanos() as u64;
        let mut next_wake = Instant::now();
        let mut executed = 0u64;

        loop {
            if !self.running.load(Ordering::SeqCst) {
                return StopReason::Signal;
            }
            if limit.is_some_and(|n| executed >= n) {
                return StopReason::TickLimit;
            }
            next_wake += self.tick_period;

            let tick_start = Instant::now();
            let out = self.tick();
            let duration_ns = tick_start.elapsed().as_nanos() as u64;
            self.stats.record(duration_ns);
            executed += 1;

            if duration_ns > budget_ns {
                self.stats.overruns += 1;
                if self.stats.overruns == 1 || self.stats.overruns % 100 == 0 {
                    warn!(
                        duration_us = duration_ns / 1000,
                        budget_us = budget_ns / 1000,
                        overruns = self.stats.overruns,
                        "Tick overrun"
                    );
                }
            }

            if out.shutdown_requested {
                if self.honor_shutdown_request {
                    info!("Shutdown requested by transmitter");
                    return StopReason::ShutdownRequested;
                }
                debug!("Shutdown request ignored (honor_shutdown_request = false)");
            }

            if self.stats_interval_ticks > 0
                && self.stats.tick_count % self.stats_interval_ticks == 0
            {
                self.log_stats();
            }

            let now = Instant::now();
            match next_wake.checked_duration_since(now) {
                Some(remaining) => thread::sleep(remaining),
                None => {
                    // Fell behind: re-anchor instead of bursting to catch up.
                    trace!("tick schedule re-anchored");
                    next_wake = now;
                }
            }
        }
    }

    fn log_stats(&self) {
        let p = self.pipeline.stats();
        debug!(
            ticks = self.stats.tick_count,
            avg_us = self.stats.avg_tick_ns() / 1000,
            max_us = self.stats.max_tick_ns / 1000,
            overruns = self.stats.overruns,
            valid = p.valid_packets,
            malformed = p.malformed_packets,
            failsafe_entries = p.failsafe_entries,
            state = ?self.pipeline.state(),
            "Cycle stats"
        );
    }

    /// Timing statistics.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// The command pipeline.
    pub fn pipeline(&self) -> &CommandPipeline {
        &self.pipeline
    }

    /// Configured tick period.
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }
}
