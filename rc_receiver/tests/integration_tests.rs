//! Integration tests for the RC receiver.
//!
//! These tests drive the full receive path: a transport feeding the cycle
//! runner, the pipeline deciding the target and the simulated actuator
//! recording what would have reached the hardware.

mod integration;
