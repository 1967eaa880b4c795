//! Link loss and recovery through the full cycle.

use rc_common::codec::encode;
use rc_common::command::ControlCommand;
use rc_receiver::state::LinkState;

use super::default_rig;

#[test]
fn silence_beyond_timeout_stops_the_vehicle() {
    let mut rig = default_rig();
    rig.inbox.inject(&encode(&ControlCommand::new(70.0, 0.0, 30.0)));
    let out = rig.runner.tick();
    assert_eq!(out.state, LinkState::Active);
    assert_eq!(rig.probe.snapshot().drive_speed_percent, 70.0);

    // 25 ticks at 50 Hz is exactly the 500 ms timeout: still holding.
    for _ in 0..25 {
        let out = rig.runner.tick();
        assert_eq!(out.state, LinkState::Active);
    }
    assert_eq!(rig.probe.snapshot().drive_speed_percent, 70.0);

    let out = rig.runner.tick();
    assert_eq!(out.state, LinkState::Failsafe);
    assert_eq!(out.transition, Some((LinkState::Active, LinkState::Failsafe)));

    let snap = rig.probe.snapshot();
    assert_eq!(snap.drive_speed_percent, 0.0);
    assert_eq!(snap.steering_percent, 0.0);
    assert_eq!(snap.drive.forward_duty_percent, 0.0);
    assert_eq!(snap.drive.reverse_duty_percent, 0.0);
}

#[test]
fn malformed_traffic_does_not_keep_the_link_alive() {
    let mut rig = default_rig();
    rig.inbox.inject(&encode(&ControlCommand::new(50.0, 0.0, 0.0)));
    rig.runner.tick();

    for _ in 0..26 {
        rig.inbox.inject(&[0xAB; 5]);
        rig.runner.tick();
    }
    assert_eq!(rig.runner.pipeline().state(), LinkState::Failsafe);
    assert_eq!(rig.runner.pipeline().stats().malformed_packets, 26);
    assert_eq!(rig.probe.snapshot().drive_speed_percent, 0.0);
}

#[test]
fn noise_behind_every_command_does_not_starve_the_link() {
    let mut rig = default_rig();
    for _ in 0..40 {
        rig.inbox.inject(&encode(&ControlCommand::new(60.0, 0.0, 0.0)));
        rig.inbox.inject(&[0xAB; 5]);
        let out = rig.runner.tick();
        assert_eq!(out.state, LinkState::Active);
    }

    let stats = rig.runner.pipeline().stats();
    assert_eq!(stats.valid_packets, 40);
    assert_eq!(stats.malformed_packets, 40);
    assert_eq!(stats.failsafe_entries, 0);
    assert_eq!(rig.probe.snapshot().drive_speed_percent, 60.0);
}

#[test]
fn first_valid_command_after_failsafe_resumes_control() {
    let mut rig = default_rig();
    rig.inbox.inject(&encode(&ControlCommand::new(40.0, 0.0, 0.0)));
    rig.runner.tick();
    for _ in 0..30 {
        rig.runner.tick();
    }
    assert_eq!(rig.runner.pipeline().state(), LinkState::Failsafe);

    rig.inbox.inject(&encode(&ControlCommand::new(0.0, 25.0, -40.0)));
    let out = rig.runner.tick();
    assert_eq!(out.transition, Some((LinkState::Failsafe, LinkState::Active)));

    let snap = rig.probe.snapshot();
    assert_eq!(snap.drive_speed_percent, -25.0);
    assert_eq!(snap.steering_percent, -40.0);
    assert_eq!(rig.runner.pipeline().stats().failsafe_entries, 1);
}

#[test]
fn no_output_before_first_command() {
    let mut rig = default_rig();
    for _ in 0..100 {
        let out = rig.runner.tick();
        assert_eq!(out.state, LinkState::AwaitingFirstCommand);
    }
    assert!(rig.probe.drive_history().iter().all(|&d| d == 0.0));
}

#[test]
fn radio_link_drop_between_pair_triggers_failsafe() {
    use rc_common::transport::{LoopbackRadio, PacketRadioChannel, RadioConfig, Transport};
    use rc_receiver::actuator::{ActuatorConfig, ActuatorGuard, SimulatedActuator};
    use rc_receiver::config::ReceiverConfig;
    use rc_receiver::cycle::CycleRunner;

    let (tx_radio, rx_radio) = LoopbackRadio::pair();
    let link = tx_radio.handle();
    let mut tx = PacketRadioChannel::open(Box::new(tx_radio), &RadioConfig::default()).unwrap();
    let rx = PacketRadioChannel::open(Box::new(rx_radio), &RadioConfig::default()).unwrap();

    let sim = SimulatedActuator::new();
    let probe = sim.probe();
    let guard = ActuatorGuard::acquire(Box::new(sim), &ActuatorConfig::default()).unwrap();
    let mut runner = CycleRunner::new(&ReceiverConfig::default(), Box::new(rx), guard);

    let cmd = encode(&ControlCommand::new(55.0, 0.0, 10.0));
    tx.send(&cmd).unwrap();
    runner.tick();
    assert_eq!(probe.snapshot().drive_speed_percent, 55.0);

    link.set_link_up(false);
    for _ in 0..26 {
        assert!(tx.send(&cmd).is_err());
        runner.tick();
    }
    assert_eq!(runner.pipeline().state(), LinkState::Failsafe);
    assert_eq!(probe.snapshot().drive_speed_percent, 0.0);
    assert_eq!(link.lost_frames(), 26);

    link.set_link_up(true);
    tx.send(&cmd).unwrap();
    runner.tick();
    assert_eq!(runner.pipeline().state(), LinkState::Active);
    assert_eq!(probe.snapshot().drive_speed_percent, 55.0);
}
