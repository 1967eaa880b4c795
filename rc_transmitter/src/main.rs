//! # RC Transmitter
//!
//! Reads stick samples (stdin lines or a simulated sweep), normalizes them
//! and streams commands to the receiver until Ctrl-C or end of input, then
//! sends a short burst of neutral commands.

use clap::Parser;
use rc_common::config::ConfigError;
use rc_common::consts::DEFAULT_TRANSMITTER_CONFIG;
use rc_common::transport::{RadioRegistry, open_transport};
use rc_transmitter::command_cell::SharedCommand;
use rc_transmitter::config::{InputKind, TransmitterConfig, load_config};
use rc_transmitter::error::TransmitterError;
use rc_transmitter::input::{open_input, spawn_input_thread};
use rc_transmitter::normalize::AxisMap;
use rc_transmitter::sender::CommandSender;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// RC Transmitter: stick input to command stream
#[derive(Parser, Debug)]
#[command(name = "rc_transmitter")]
#[command(version)]
#[command(about = "Normalize stick input and stream RC commands")]
struct Args {
    /// Path to the transmitter configuration TOML.
    #[arg(default_value = DEFAULT_TRANSMITTER_CONFIG)]
    config: PathBuf,

    /// Use the simulated stick sweep instead of the configured input.
    #[arg(long)]
    simulate: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let loaded = load_config(&args.config);
    let level = match &loaded {
        Ok(config) => config.shared.log_level.into(),
        Err(_) => Level::INFO,
    };
    setup_tracing(&args, level);

    info!("RC Transmitter v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, loaded) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("RC Transmitter shutdown complete");
}

fn run(
    args: &Args,
    loaded: Result<TransmitterConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = loaded.map_err(|e| format!("{}: {e}", args.config.display()))?;
    if args.simulate {
        config.input.source = InputKind::Simulated;
    }

    let axes = AxisMap::from_config(&config.axes)?;
    info!(
        service = %config.shared.service_name,
        rate_hz = config.send.rate_hz,
        axes = axes.len(),
        input = ?config.input.source,
        "Config OK"
    );

    let transport = open_transport(&config.transport, &RadioRegistry::with_builtin())?;
    let command = SharedCommand::new();
    let mut sender = CommandSender::new(&config.send, transport, command.clone());

    let running = sender.running_flag();
    let on_signal = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        on_signal.store(false, Ordering::SeqCst);
    })?;

    let source = open_input(&config.input, &config.axes);
    // The thread may stay blocked on stdin after the loop ends; it is not joined.
    spawn_input_thread(source, axes, command, running)
        .map_err(|e| TransmitterError::Spawn(e.to_string()))?;

    sender.run();

    let stats = sender.stats();
    info!(
        ticks = stats.ticks,
        sent = stats.sent,
        failed = stats.failed,
        "Send loop stopped"
    );
    Ok(())
}

/// Setup tracing subscriber. `--verbose` overrides the configured level.
fn setup_tracing(args: &Args, configured: Level) {
    let level = if args.verbose { Level::DEBUG } else { configured };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
