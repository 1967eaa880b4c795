//! RC Common Library
//!
//! Shared definitions for both ends of the RC command link: the canonical
//! [`command::ControlCommand`], the wire codec that turns it into a packet,
//! the transport adapters that move packets over UDP or a packet radio, and
//! the TOML configuration loader used by the receiver and transmitter binaries.
//!
//! # Module Structure
//!
//! - [`command`] - `ControlCommand`, `AuxFlags`, `RawSample`
//! - [`codec`] - Packet encode/decode with schema dispatch
//! - [`transport`] - `Transport` trait, UDP and packet radio channels
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - System-wide constants and defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use rc_common::prelude::*;
//!
//! let cmd = ControlCommand::new(40.0, 0.0, -12.5);
//! let bytes = encode(&cmd);
//! assert_eq!(decode(&bytes).unwrap(), cmd);
//! ```

#![deny(missing_docs)]

pub mod codec;
pub mod command;
pub mod config;
pub mod consts;
pub mod prelude;
pub mod transport;
