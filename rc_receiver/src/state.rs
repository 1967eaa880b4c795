//! Link state machine.
//!
//! ```text
//! AwaitingFirstCommand ──valid──▶ Active ──timeout──▶ Failsafe
//!                                   ▲                    │
//!                                   └───────valid────────┘
//! ```
//!
//! Only `Active` lets a command through to the actuators.

/// Receiver link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LinkState {
    /// No valid command seen since startup.
    AwaitingFirstCommand = 0,
    /// Commands arriving within the timeout.
    Active = 1,
    /// Link lost; outputs held at neutral.
    Failsafe = 2,
}

impl Default for LinkState {
    fn default() -> Self {
        Self::AwaitingFirstCommand
    }
}

/// Events that drive the link state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// A payload decoded successfully this tick.
    ValidCommand,
    /// The watchdog expired.
    Timeout,
}

/// Result of a link transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTransition {
    /// State changed.
    Changed {
        /// State before the event.
        from: LinkState,
        /// State after the event.
        to: LinkState,
    },
    /// Event did not change the state.
    Unchanged(LinkState),
}

/// Link state machine.
#[derive(Debug, Clone, Default)]
pub struct LinkStateMachine {
    state: LinkState,
}

impl LinkStateMachine {
    /// Machine in `AwaitingFirstCommand`.
    pub const fn new() -> Self {
        Self {
            state: LinkState::AwaitingFirstCommand,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> LinkState {
        self.state
    }

    /// Whether commands currently reach the actuators.
    #[inline]
    pub const fn passes_commands(&self) -> bool {
        matches!(self.state, LinkState::Active)
    }

    /// Handle a link event.
    pub fn handle_event(&mut self, event: LinkEvent) -> LinkTransition {
        use LinkEvent as E;
        use LinkState as S;

        let next = match (self.state, event) {
            (S::AwaitingFirstCommand | S::Failsafe, E::ValidCommand) => S::Active,
            (S::Active, E::Timeout) => S::Failsafe,

            // Nothing to lose before the first command; failsafe is sticky.
            (S::AwaitingFirstCommand, E::Timeout)
            | (S::Failsafe, E::Timeout)
            | (S::Active, E::ValidCommand) => return LinkTransition::Unchanged(self.state),
        };

        let from = self.state;
        self.state = next;
        LinkTransition::Changed { from, to: next }
    }
}
