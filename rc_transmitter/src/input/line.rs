//! Text line input: `axis_id value [timestamp_us]` per line.
//!
//! Lets any event reader feed the transmitter through a pipe, e.g.
//! `evtest-to-lines /dev/input/event3 | rc_transmitter`. Blank lines and
//! lines starting with `#` are skipped. Malformed lines are logged and
//! skipped; only an I/O error ends the stream early.

use std::io::BufRead;
use std::time::Instant;

use rc_common::command::RawSample;
use tracing::warn;

use super::{InputError, InputSource};

/// Reads samples from any buffered reader.
pub struct LineInput<R> {
    reader: R,
    line: String,
    started: Instant,
    line_no: u64,
    rejected: u64,
}

impl<R: BufRead + Send> LineInput<R> {
    /// Wrap `reader`. Timestamps default to time since construction.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            started: Instant::now(),
            line_no: 0,
            rejected: 0,
        }
    }

    /// Lines that could not be parsed.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn elapsed_us(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// Parse one line. `None` for blank and comment lines.
pub(crate) fn parse_line(line: &str, now_us: u64) -> Option<Result<RawSample, String>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(parse_fields(line, now_us))
}

fn parse_fields(line: &str, now_us: u64) -> Result<RawSample, String> {
    let mut fields = line.split_whitespace();
    let axis_id = fields
        .next()
        .ok_or("missing axis id")?
        .parse::<u16>()
        .map_err(|e| format!("axis id: {e}"))?;
    let raw_value = fields
        .next()
        .ok_or("missing value")?
        .parse::<i32>()
        .map_err(|e| format!("value: {e}"))?;
    let timestamp_us = match fields.next() {
        Some(ts) => ts.parse::<u64>().map_err(|e| format!("timestamp: {e}"))?,
        None => now_us,
    };
    if fields.next().is_some() {
        return Err("trailing fields".to_string());
    }
    Ok(RawSample::new(axis_id, raw_value, timestamp_us))
}

impl<R: BufRead + Send> InputSource for LineInput<R> {
    fn name(&self) -> &'static str {
        "lines"
    }

    fn next_sample(&mut self) -> Result<Option<RawSample>, InputError> {
        loop {
            self.line.clear();
            let n = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| InputError::ReadFailed(e.to_string()))?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            match parse_line(&self.line, self.elapsed_us()) {
                None => continue,
                Some(Ok(sample)) => return Ok(Some(sample)),
                Some(Err(reason)) => {
                    self.rejected += 1;
                    warn!(line = self.line_no, "Skipping input line: {reason}");
                }
            }
        }
    }
}
