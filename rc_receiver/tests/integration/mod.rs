//! Shared fixtures for receiver integration tests.

mod control_flow;
mod end_to_end;
mod failsafe;

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use rc_common::transport::{Payload, Transport, TransportError};
use rc_receiver::actuator::{ActuatorConfig, ActuatorGuard, SimulatedActuator, SimulationProbe};
use rc_receiver::config::ReceiverConfig;
use rc_receiver::cycle::CycleRunner;

/// In-memory transport the test fills directly. Payloads of any size and
/// content come out in the order they went in.
#[derive(Clone, Default)]
pub struct Inbox {
    queue: Arc<Mutex<VecDeque<Payload>>>,
}

impl Inbox {
    /// Queue a payload as if it had just arrived.
    pub fn inject(&self, payload: &[u8]) {
        self.queue.lock().push_back(payload.to_vec());
    }

    /// Payloads not yet polled.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

impl Transport for Inbox {
    fn name(&self) -> &'static str {
        "inbox"
    }

    fn send(&mut self, _payload: &[u8]) -> Result<(), TransportError> {
        Ok(())
    }

    fn try_receive(&mut self) -> Option<Payload> {
        self.queue.lock().pop_front()
    }
}

/// Receiver wired to an in-memory inbox and a simulated actuator.
pub struct Rig {
    pub runner: CycleRunner,
    pub inbox: Inbox,
    pub probe: SimulationProbe,
}

/// Build a rig from `config`.
pub fn rig(config: &ReceiverConfig) -> Rig {
    let inbox = Inbox::default();

    let sim = SimulatedActuator::new();
    let probe = sim.probe();
    let guard = ActuatorGuard::acquire(Box::new(sim), &ActuatorConfig::default()).unwrap();

    Rig {
        runner: CycleRunner::new(config, Box::new(inbox.clone()), guard),
        inbox,
        probe,
    }
}

/// Default config: 50 Hz, 500 ms timeout (25 ticks).
pub fn default_rig() -> Rig {
    rig(&ReceiverConfig::default())
}
