//! Command to output mapping through the cycle runner.

use rc_common::codec::{WireSchema, encode, encode_as};
use rc_common::command::{AuxFlags, ControlCommand};
use rc_receiver::config::ReceiverConfig;
use rc_receiver::cycle::StopReason;
use rc_receiver::pipeline::PacketOutcome;

use super::{default_rig, rig};

#[test]
fn throttle_drives_forward_duty() {
    let mut rig = default_rig();
    rig.inbox.inject(&encode(&ControlCommand::new(60.0, 0.0, 0.0)));
    rig.runner.tick();

    let snap = rig.probe.snapshot();
    assert_eq!(snap.drive.forward_duty_percent, 60.0);
    assert_eq!(snap.drive.reverse_duty_percent, 0.0);
}

#[test]
fn brake_drives_reverse_duty() {
    let mut rig = default_rig();
    rig.inbox.inject(&encode(&ControlCommand::new(0.0, 30.0, 0.0)));
    rig.runner.tick();

    let snap = rig.probe.snapshot();
    assert_eq!(snap.drive_speed_percent, -30.0);
    assert_eq!(snap.drive.forward_duty_percent, 0.0);
    assert_eq!(snap.drive.reverse_duty_percent, 30.0);
}

#[test]
fn steering_inside_deadband_centers_servo() {
    let mut rig = default_rig();
    rig.inbox.inject(&encode(&ControlCommand::new(20.0, 0.0, 4.0)));
    rig.runner.tick();

    let snap = rig.probe.snapshot();
    assert_eq!(snap.steering_percent, 0.0);
    assert_eq!(snap.servo.pulse_width_us, 980.0);
}

#[test]
fn full_lock_reaches_pulse_limits() {
    let mut rig = default_rig();
    rig.inbox.inject(&encode(&ControlCommand::new(0.0, 0.0, -100.0)));
    rig.runner.tick();
    assert_eq!(rig.probe.snapshot().servo.pulse_width_us, 630.0);

    rig.inbox.inject(&encode(&ControlCommand::new(0.0, 0.0, 100.0)));
    rig.runner.tick();
    assert_eq!(rig.probe.snapshot().servo.pulse_width_us, 1330.0);
}

#[test]
fn newest_packet_wins_within_a_tick() {
    let mut rig = default_rig();
    rig.inbox.inject(&encode(&ControlCommand::new(10.0, 0.0, 0.0)));
    rig.inbox.inject(&encode(&ControlCommand::new(90.0, 0.0, 0.0)));
    rig.runner.tick();

    assert_eq!(rig.probe.snapshot().drive_speed_percent, 90.0);
    assert_eq!(rig.inbox.pending(), 0);
}

#[test]
fn drain_is_bounded_per_tick() {
    let mut config = ReceiverConfig::default();
    config.control.max_packets_per_tick = 2;
    let mut rig = rig(&config);
    for throttle in [10.0, 20.0, 30.0] {
        rig.inbox.inject(&encode(&ControlCommand::new(throttle, 0.0, 0.0)));
    }

    let out = rig.runner.tick();
    assert_eq!(out.received, 2);
    assert_eq!(rig.probe.snapshot().drive_speed_percent, 20.0);
    assert_eq!(rig.inbox.pending(), 1);

    rig.runner.tick();
    assert_eq!(rig.probe.snapshot().drive_speed_percent, 30.0);
}

#[test]
fn long_structured_command_is_applied() {
    let mut rig = default_rig();
    let json = format!(r#"{{"throttle":40,"note":"{}"}}"#, "x".repeat(300));
    rig.inbox.inject(json.as_bytes());

    let out = rig.runner.tick();
    assert_eq!(out.packet, PacketOutcome::Valid(WireSchema::Structured));
    assert_eq!(rig.probe.snapshot().drive_speed_percent, 40.0);
}

#[test]
fn every_schema_is_accepted() {
    let mut rig = default_rig();
    let cmd = ControlCommand::from_drive(-45.0, 20.0);
    for schema in [WireSchema::Binary, WireSchema::Drive, WireSchema::Structured] {
        rig.inbox.inject(&encode_as(&cmd, schema));
        let out = rig.runner.tick();
        assert_eq!(out.packet, PacketOutcome::Valid(schema));
        assert_eq!(rig.probe.snapshot().drive_speed_percent, -45.0);
        assert_eq!(rig.probe.snapshot().steering_percent, 20.0);
    }
}

#[test]
fn led_follows_command() {
    let mut rig = default_rig();
    let cmd = ControlCommand::NEUTRAL.with_aux(AuxFlags::LED);
    rig.inbox.inject(&encode_as(&cmd, WireSchema::Structured));
    rig.runner.tick();
    assert!(rig.probe.snapshot().led);

    rig.inbox.inject(&encode_as(&ControlCommand::NEUTRAL, WireSchema::Structured));
    rig.runner.tick();
    assert!(!rig.probe.snapshot().led);
}

#[test]
fn write_failures_are_counted_not_fatal() {
    let mut rig = default_rig();
    rig.probe.fail_writes(true);
    rig.inbox.inject(&encode(&ControlCommand::new(30.0, 0.0, 0.0)));
    rig.runner.tick();
    rig.runner.tick();
    assert_eq!(rig.runner.stats().write_errors, 2);

    rig.probe.fail_writes(false);
    rig.runner.tick();
    assert_eq!(rig.probe.snapshot().drive_speed_percent, 30.0);
    assert_eq!(rig.runner.stats().write_errors, 2);
}

#[test]
fn shutdown_request_stops_loop_when_honored() {
    let mut config = ReceiverConfig::default();
    config.control.tick_rate_hz = 100;
    config.control.honor_shutdown_request = true;
    let mut rig = rig(&config);

    let cmd = ControlCommand::NEUTRAL.with_aux(AuxFlags::SHUTDOWN);
    rig.inbox.inject(&encode_as(&cmd, WireSchema::Structured));
    assert_eq!(rig.runner.run_for(50), StopReason::ShutdownRequested);
    assert_eq!(rig.runner.stats().tick_count, 1);
}

#[test]
fn shutdown_request_ignored_by_default() {
    let mut config = ReceiverConfig::default();
    config.control.tick_rate_hz = 100;
    let mut rig = rig(&config);

    let cmd = ControlCommand::NEUTRAL.with_aux(AuxFlags::SHUTDOWN);
    rig.inbox.inject(&encode_as(&cmd, WireSchema::Structured));
    assert_eq!(rig.runner.run_for(5), StopReason::TickLimit);
    assert_eq!(rig.runner.stats().tick_count, 5);
}
