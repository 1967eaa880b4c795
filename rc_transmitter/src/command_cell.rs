//! Latest command shared between the input thread and the send loop.
//!
//! The input thread merges one field at a time; the send loop copies the
//! whole command out. Both hold the lock for a copy and nothing else, so a
//! reader always sees a complete command.

use std::sync::Arc;

use parking_lot::Mutex;
use rc_common::command::ControlCommand;

use crate::normalize::CommandField;

/// Cross-thread command cell.
#[derive(Debug, Clone, Default)]
pub struct SharedCommand {
    inner: Arc<Mutex<ControlCommand>>,
}

impl SharedCommand {
    /// Cell holding the neutral command.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one field into the current command.
    pub fn apply(&self, field: CommandField) {
        let mut current = self.inner.lock();
        *current = merge(*current, field);
    }

    /// Copy of the current command.
    pub fn snapshot(&self) -> ControlCommand {
        *self.inner.lock()
    }

    /// Back to neutral.
    pub fn reset(&self) {
        *self.inner.lock() = ControlCommand::NEUTRAL;
    }
}

/// `cmd` with `field` replaced.
pub fn merge(cmd: ControlCommand, field: CommandField) -> ControlCommand {
    let (throttle, brake, steering) = (
        cmd.throttle_percent(),
        cmd.brake_percent(),
        cmd.steering_percent(),
    );
    let mut aux = cmd.aux();
    let next = match field {
        CommandField::Throttle(v) => ControlCommand::new(v, brake, steering),
        CommandField::Brake(v) => ControlCommand::new(throttle, v, steering),
        CommandField::Steering(v) => ControlCommand::new(throttle, brake, v),
        CommandField::Speed(v) => ControlCommand::from_drive(v, steering),
        CommandField::Aux { flag, on } => {
            aux.set(flag, on);
            cmd
        }
    };
    next.with_aux(aux)
}
