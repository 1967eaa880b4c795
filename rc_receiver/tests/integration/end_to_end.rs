//! UDP transmitter → receiver → simulated outputs, plus startup and teardown.

use std::net::SocketAddr;

use rc_common::codec::encode;
use rc_common::command::ControlCommand;
use rc_common::transport::{
    DatagramChannel, RadioRegistry, Transport, TransportConfig, UdpConfig,
};
use rc_receiver::actuator::{
    ActuatorConfig, ActuatorError, ActuatorGuard, ActuatorRegistry, SimulatedActuator,
};
use rc_receiver::config::ReceiverConfig;
use rc_receiver::cycle::{CycleRunner, StopReason};
use rc_receiver::error::ReceiverError;
use rc_receiver::state::LinkState;

fn localhost_any() -> UdpConfig {
    UdpConfig {
        bind: "127.0.0.1:0".parse().unwrap(),
        ..UdpConfig::default()
    }
}

#[test]
fn udp_commands_reach_the_outputs() {
    let receiver = DatagramChannel::open(&localhost_any()).unwrap();
    let addr: SocketAddr = receiver.local_addr().unwrap();
    let mut sender = DatagramChannel::open(&UdpConfig::sender(addr)).unwrap();

    let sim = SimulatedActuator::new();
    let probe = sim.probe();
    let guard = ActuatorGuard::acquire(Box::new(sim), &ActuatorConfig::default()).unwrap();

    let mut config = ReceiverConfig::default();
    config.control.tick_rate_hz = 100;
    let mut runner = CycleRunner::new(&config, Box::new(receiver), guard);

    sender
        .send(&encode(&ControlCommand::new(60.0, 0.0, -50.0)))
        .unwrap();
    // Loopback delivery is not instantaneous; give it a few ticks.
    assert_eq!(runner.run_for(10), StopReason::TickLimit);

    assert_eq!(runner.pipeline().state(), LinkState::Active);
    let snap = probe.snapshot();
    assert_eq!(snap.drive_speed_percent, 60.0);
    assert_eq!(snap.steering_percent, -50.0);
    assert_eq!(snap.drive.forward_duty_percent, 60.0);
}

#[test]
fn dropping_the_runner_neutralizes_and_releases() {
    let receiver = DatagramChannel::open(&localhost_any()).unwrap();
    let sim = SimulatedActuator::new();
    let probe = sim.probe();
    let guard = ActuatorGuard::acquire(Box::new(sim), &ActuatorConfig::default()).unwrap();
    let mut runner = CycleRunner::new(&ReceiverConfig::default(), Box::new(receiver), guard);

    runner.tick();
    drop(runner);

    let snap = probe.snapshot();
    assert!(snap.released);
    assert_eq!(snap.drive_speed_percent, 0.0);
    assert_eq!(snap.steering_percent, 0.0);
    assert!(!snap.led);
}

#[test]
fn clearing_the_running_flag_stops_the_loop() {
    let mut config = ReceiverConfig::default();
    config.transport = TransportConfig::Udp(localhost_any());
    let mut runner = CycleRunner::from_config(
        &config,
        &RadioRegistry::with_builtin(),
        &ActuatorRegistry::with_builtin(),
    )
    .unwrap();

    runner.running_flag().store(false, std::sync::atomic::Ordering::SeqCst);
    assert_eq!(runner.run(), StopReason::Signal);
    assert_eq!(runner.stats().tick_count, 0);
}

#[test]
fn unknown_actuator_driver_fails_startup() {
    let mut config = ReceiverConfig::default();
    config.transport = TransportConfig::Udp(localhost_any());
    config.actuator.driver = "pca9685".to_string();

    let result = CycleRunner::from_config(
        &config,
        &RadioRegistry::with_builtin(),
        &ActuatorRegistry::with_builtin(),
    );
    assert!(matches!(
        result,
        Err(ReceiverError::Actuator(ActuatorError::DriverNotFound(_)))
    ));
}

#[test]
fn radio_transport_from_config() {
    let mut config = ReceiverConfig::default();
    config.transport = TransportConfig::Radio(Default::default());
    let runner = CycleRunner::from_config(
        &config,
        &RadioRegistry::with_builtin(),
        &ActuatorRegistry::with_builtin(),
    );
    assert!(runner.is_ok());
}
