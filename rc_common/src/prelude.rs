//! Prelude module for common re-exports.
//!
//! ```rust
//! use rc_common::prelude::*;
//! ```

// ─── Commands ───────────────────────────────────────────────────────
pub use crate::command::{AuxFlags, ControlCommand, RawSample};

// ─── Codec ──────────────────────────────────────────────────────────
pub use crate::codec::{DecodeError, WireSchema, decode, decode_packet, encode, encode_as};

// ─── Transport ──────────────────────────────────────────────────────
pub use crate::transport::{
    Payload, RadioRegistry, Transport, TransportConfig, TransportError, open_transport,
};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_TICK_RATE_HZ, PERCENT_MAX, SIGNED_PERCENT_MIN};
