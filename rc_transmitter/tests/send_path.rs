//! Input → normalize → send → decode over a real UDP socket.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Duration;

use rc_common::codec::decode;
use rc_common::command::{ControlCommand, RawSample};
use rc_common::transport::{DatagramChannel, Transport, UdpConfig};
use rc_transmitter::command_cell::SharedCommand;
use rc_transmitter::config::{ABS_RZ, ABS_X, SendConfig, default_axes};
use rc_transmitter::input::{ScriptedInput, pump};
use rc_transmitter::normalize::AxisMap;
use rc_transmitter::sender::CommandSender;

fn receiver() -> DatagramChannel {
    DatagramChannel::open(&UdpConfig {
        bind: "127.0.0.1:0".parse().unwrap(),
        ..UdpConfig::default()
    })
    .unwrap()
}

fn drain(rx: &mut DatagramChannel) -> Vec<ControlCommand> {
    thread::sleep(Duration::from_millis(50));
    let mut out = Vec::new();
    while let Some(payload) = rx.try_receive() {
        out.push(decode(&payload).unwrap());
    }
    out
}

#[test]
fn scripted_input_reaches_the_wire() {
    let mut rx = receiver();
    let tx = DatagramChannel::open(&UdpConfig::sender(rx.local_addr().unwrap())).unwrap();

    let command = SharedCommand::new();
    let axes = AxisMap::from_config(&default_axes()).unwrap();
    let mut source = ScriptedInput::new([
        RawSample::new(ABS_X, 0, 0),
        RawSample::new(ABS_RZ, 1023, 1),
    ]);
    pump(&mut source, &axes, &command, &AtomicBool::new(true));

    let config = SendConfig {
        rate_hz: 100,
        neutral_repeats_on_exit: 2,
        ..SendConfig::default()
    };
    let mut sender = CommandSender::new(&config, Box::new(tx), command);
    sender.run_for(3);

    let received = drain(&mut rx);
    assert_eq!(received.len(), 5);
    assert_eq!(received[0], ControlCommand::new(100.0, 0.0, -100.0));
    assert_eq!(received[4], ControlCommand::NEUTRAL);
}

#[test]
fn ctrl_c_flag_stops_sender_with_neutral() {
    let mut rx = receiver();
    let tx = DatagramChannel::open(&UdpConfig::sender(rx.local_addr().unwrap())).unwrap();

    let config = SendConfig {
        rate_hz: 100,
        neutral_repeats_on_exit: 1,
        ..SendConfig::default()
    };
    let mut sender = CommandSender::new(&config, Box::new(tx), SharedCommand::new());
    let running: Arc<AtomicBool> = sender.running_flag();

    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(60));
        running.store(false, std::sync::atomic::Ordering::SeqCst);
    });
    sender.run();
    stopper.join().unwrap();

    assert!(sender.stats().ticks >= 1);
    assert_eq!(sender.stats().neutral_sent, 1);
    let received = drain(&mut rx);
    assert_eq!(received.last(), Some(&ControlCommand::NEUTRAL));
}
