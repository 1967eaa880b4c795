//! # RC Transmitter Library
//!
//! Handheld side of the link. An input thread reads raw device samples,
//! normalizes them through the configured axis calibrations and merges them
//! into a [`command_cell::SharedCommand`]. The send loop snapshots that
//! command at a fixed rate and pushes it through the transport.
//!
//! - [`normalize`] - raw sample to `CommandField`
//! - [`command_cell`] - cross-thread latest command
//! - [`input`] - `InputSource` trait, line/simulated/scripted sources
//! - [`sender`] - fixed-rate send loop with neutral-on-exit
//! - [`config`] - TOML configuration

#![deny(missing_docs)]

pub mod command_cell;
pub mod config;
pub mod error;
pub mod input;
pub mod normalize;
pub mod sender;
