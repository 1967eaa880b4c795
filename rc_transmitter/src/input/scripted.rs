//! Fixed sample list.

use std::collections::VecDeque;

use rc_common::command::RawSample;

use super::{InputError, InputSource};

/// Replays a fixed list of samples, then ends.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    samples: VecDeque<RawSample>,
}

impl ScriptedInput {
    /// Source that yields `samples` in order.
    pub fn new(samples: impl IntoIterator<Item = RawSample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }

    /// Samples not yet returned.
    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl InputSource for ScriptedInput {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn next_sample(&mut self) -> Result<Option<RawSample>, InputError> {
        Ok(self.samples.pop_front())
    }
}
