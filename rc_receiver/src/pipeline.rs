//! Command pipeline: payload in, actuator target out, once per tick.
//!
//! Each tick the pipeline:
//! 1. decodes every payload polled this tick, oldest first (malformed
//!    payloads are counted and otherwise ignored),
//! 2. applies the deadband to the newest valid command and resets the
//!    watchdog,
//! 3. advances the link state machine,
//! 4. recomputes and re-clamps the target.
//!
//! Outside `Active` the target is neutral. A command is applied whole or not
//! at all.

use std::time::Duration;

use rc_common::codec::{DecodeError, WireSchema, decode_packet};
use rc_common::command::{AuxFlags, ControlCommand, clamp_finite};
use rc_common::consts::{PERCENT_MAX, SIGNED_PERCENT_MIN};
use tracing::{debug, info, warn};

use crate::deadband::Deadband;
use crate::link::LinkHealth;
use crate::state::{LinkEvent, LinkState, LinkStateMachine, LinkTransition};

// ─── Actuator Target ────────────────────────────────────────────────

/// What the actuators should be doing this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorTarget {
    drive_speed_percent: f32,
    steering_percent: f32,
    aux: AuxFlags,
}

impl ActuatorTarget {
    /// Stopped, straight, all outputs off.
    pub const NEUTRAL: Self = Self {
        drive_speed_percent: 0.0,
        steering_percent: 0.0,
        aux: AuxFlags::empty(),
    };

    /// Build a target, clamping both axes into [-100, 100].
    pub fn new(drive_speed_percent: f32, steering_percent: f32, aux: AuxFlags) -> Self {
        Self {
            drive_speed_percent: clamp_finite(drive_speed_percent, SIGNED_PERCENT_MIN, PERCENT_MAX),
            steering_percent: clamp_finite(steering_percent, SIGNED_PERCENT_MIN, PERCENT_MAX),
            aux: aux & AuxFlags::LED,
        }
    }

    /// Signed drive speed [-100, 100] %.
    #[inline]
    pub const fn drive_speed_percent(&self) -> f32 {
        self.drive_speed_percent
    }

    /// Steering [-100, 100] %.
    #[inline]
    pub const fn steering_percent(&self) -> f32 {
        self.steering_percent
    }

    /// Output flags. Only `LED` is ever set.
    #[inline]
    pub const fn aux(&self) -> AuxFlags {
        self.aux
    }

    /// LED output state.
    #[inline]
    pub const fn led(&self) -> bool {
        self.aux.contains(AuxFlags::LED)
    }

    /// Same target with both axes clamped again.
    #[must_use]
    pub fn reclamped(&self) -> Self {
        Self::new(self.drive_speed_percent, self.steering_percent, self.aux)
    }
}

impl Default for ActuatorTarget {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// `drive = clamp(throttle - brake)`, steering passed through, LED follows
/// the command.
pub fn compute_target(cmd: &ControlCommand) -> ActuatorTarget {
    ActuatorTarget::new(
        cmd.throttle_percent() - cmd.brake_percent(),
        cmd.steering_percent(),
        cmd.aux(),
    )
}

// ─── Tick Output ────────────────────────────────────────────────────

/// What happened to this tick's payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketOutcome {
    /// Nothing was polled.
    NoPacket,
    /// The newest valid payload decoded with the given schema.
    Valid(WireSchema),
    /// Nothing decoded; the last payload failed with this error.
    Malformed(DecodeError),
}

/// Result of one pipeline tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Target to write this tick.
    pub target: ActuatorTarget,
    /// Link state after this tick.
    pub state: LinkState,
    /// Transition taken this tick, if any.
    pub transition: Option<(LinkState, LinkState)>,
    /// Fate of the polled payloads.
    pub packet: PacketOutcome,
    /// Payloads polled this tick.
    pub received: usize,
    /// A valid command polled this tick carried the shutdown request.
    pub shutdown_requested: bool,
}

// ─── Statistics ─────────────────────────────────────────────────────

/// Pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Ticks processed.
    pub ticks: u64,
    /// Payloads that decoded.
    pub valid_packets: u64,
    /// Payloads dropped as malformed.
    pub malformed_packets: u64,
    /// Times the link entered failsafe.
    pub failsafe_entries: u64,
}

// ─── Pipeline ───────────────────────────────────────────────────────

/// Receiver command pipeline.
#[derive(Debug, Clone)]
pub struct CommandPipeline {
    deadband: Deadband,
    health: LinkHealth,
    link: LinkStateMachine,
    latest: Option<ControlCommand>,
    target: ActuatorTarget,
    stats: PipelineStats,
}

impl CommandPipeline {
    /// Pipeline with an explicit watchdog limit in ticks.
    pub fn new(deadband: Deadband, timeout_ticks: u32) -> Self {
        Self {
            deadband,
            health: LinkHealth::new(timeout_ticks),
            link: LinkStateMachine::new(),
            latest: None,
            target: ActuatorTarget::NEUTRAL,
            stats: PipelineStats::default(),
        }
    }

    /// Pipeline with the watchdog given as a duration at a tick period.
    pub fn with_timeout(deadband: Deadband, timeout: Duration, tick_period: Duration) -> Self {
        let health = LinkHealth::from_timeout(timeout, tick_period);
        Self::new(deadband, health.timeout_ticks())
    }

    /// Run one tick with at most one payload.
    pub fn tick(&mut self, payload: Option<&[u8]>) -> TickOutput {
        self.tick_batch(payload)
    }

    /// Run one tick with every payload polled this tick, oldest first.
    ///
    /// The newest payload that decodes is the command; anything that fails
    /// to decode is counted as malformed and cannot displace it.
    pub fn tick_batch<'a, I>(&mut self, payloads: I) -> TickOutput
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        self.stats.ticks += 1;

        let mut newest: Option<ControlCommand> = None;
        let mut packet = PacketOutcome::NoPacket;
        let mut received = 0usize;
        let mut shutdown_requested = false;
        for bytes in payloads {
            received += 1;
            match decode_packet(bytes) {
                Ok((cmd, schema)) => {
                    self.stats.valid_packets += 1;
                    shutdown_requested |= cmd.shutdown_requested();
                    newest = Some(cmd);
                    packet = PacketOutcome::Valid(schema);
                }
                Err(e) => {
                    self.stats.malformed_packets += 1;
                    debug!("Dropping packet: {e}");
                    if newest.is_none() {
                        packet = PacketOutcome::Malformed(e);
                    }
                }
            }
        }
        let fresh = newest.map(|cmd| self.deadband.apply(&cmd));

        let event = match fresh {
            Some(cmd) => {
                self.latest = Some(cmd);
                self.health.record_valid();
                Some(LinkEvent::ValidCommand)
            }
            None => {
                self.health.record_silent_tick();
                self.health.is_expired().then_some(LinkEvent::Timeout)
            }
        };

        let transition = event.and_then(|e| match self.link.handle_event(e) {
            LinkTransition::Changed { from, to } => {
                self.on_transition(from, to);
                Some((from, to))
            }
            LinkTransition::Unchanged(_) => None,
        });

        self.target = match self.latest {
            Some(cmd) if self.link.passes_commands() => compute_target(&cmd),
            _ => ActuatorTarget::NEUTRAL,
        }
        .reclamped();

        TickOutput {
            target: self.target,
            state: self.link.state(),
            transition,
            packet,
            received,
            shutdown_requested,
        }
    }

    fn on_transition(&mut self, from: LinkState, to: LinkState) {
        match (from, to) {
            (LinkState::AwaitingFirstCommand, LinkState::Active) => {
                info!("Link acquired, first command received");
            }
            (LinkState::Active, LinkState::Failsafe) => {
                self.stats.failsafe_entries += 1;
                self.latest = None;
                warn!(
                    silent_ticks = self.health.ticks_since_valid(),
                    timeout_ticks = self.health.timeout_ticks(),
                    "Link lost, entering failsafe"
                );
            }
            (LinkState::Failsafe, LinkState::Active) => {
                info!(
                    failsafe_entries = self.stats.failsafe_entries,
                    "Link recovered"
                );
            }
            _ => {}
        }
    }

    /// Current link state.
    #[inline]
    pub const fn state(&self) -> LinkState {
        self.link.state()
    }

    /// Target computed by the last tick.
    #[inline]
    pub const fn target(&self) -> ActuatorTarget {
        self.target
    }

    /// Watchdog state.
    #[inline]
    pub const fn health(&self) -> &LinkHealth {
        &self.health
    }

    /// Counters.
    #[inline]
    pub const fn stats(&self) -> &PipelineStats {
        &self.stats
    }
}
