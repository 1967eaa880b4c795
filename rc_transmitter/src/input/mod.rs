//! Input sources and the sampling thread.
//!
//! A source produces [`RawSample`]s, blocking until one is available. The
//! sampling thread normalizes each sample and merges it into the
//! [`SharedCommand`]; the send loop never waits on input.

mod line;
mod scripted;
mod simulated;

pub use line::LineInput;
pub use scripted::ScriptedInput;
pub use simulated::SimulatedInput;

use std::io::{self, BufReader};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rc_common::command::RawSample;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::command_cell::SharedCommand;
use crate::config::{AxisConfig, InputConfig, InputKind};
use crate::normalize::{AxisMap, normalize};

/// Input errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Reading the device failed.
    #[error("Input read failed: {0}")]
    ReadFailed(String),
}

/// Blocking source of raw samples.
pub trait InputSource: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Next sample. `Ok(None)` once the source is exhausted.
    fn next_sample(&mut self) -> Result<Option<RawSample>, InputError>;
}

/// Build the configured source.
pub fn open_input(config: &InputConfig, axes: &[AxisConfig]) -> Box<dyn InputSource> {
    match config.source {
        InputKind::Stdin => Box::new(LineInput::new(BufReader::new(io::stdin()))),
        InputKind::Simulated => Box::new(SimulatedInput::new(
            axes,
            Duration::from_millis(config.sample_interval_ms),
            Duration::from_millis(config.sweep_period_ms),
        )),
    }
}

/// Run `source` until it ends, fails or `running` clears.
///
/// Returns the number of samples merged. When the source ends the running
/// flag is cleared so the send loop stops the vehicle and exits.
pub fn pump(
    source: &mut dyn InputSource,
    axes: &AxisMap,
    command: &SharedCommand,
    running: &AtomicBool,
) -> u64 {
    let mut applied = 0u64;
    while running.load(Ordering::SeqCst) {
        match source.next_sample() {
            Ok(Some(sample)) => match normalize(&sample, axes) {
                Some(field) => {
                    trace!(axis = sample.axis_id, ?field, "sample");
                    command.apply(field);
                    applied += 1;
                }
                None => debug!(axis = sample.axis_id, "Ignoring unmapped axis"),
            },
            Ok(None) => {
                info!(source = source.name(), applied, "Input ended");
                running.store(false, Ordering::SeqCst);
                break;
            }
            Err(e) => {
                warn!(source = source.name(), "{e}");
                running.store(false, Ordering::SeqCst);
                break;
            }
        }
    }
    applied
}

/// Spawn the sampling thread.
pub fn spawn_input_thread(
    mut source: Box<dyn InputSource>,
    axes: AxisMap,
    command: SharedCommand,
    running: Arc<AtomicBool>,
) -> io::Result<JoinHandle<u64>> {
    thread::Builder::new()
        .name("rc-input".to_string())
        .spawn(move || pump(source.as_mut(), &axes, &command, &running))
}
