//! # RC Receiver
//!
//! Loads the receiver TOML, opens the configured transport, acquires the
//! actuator and runs the fixed-rate control loop until Ctrl-C (or a
//! transmitter shutdown request, when the config honors it).

use clap::Parser;
use rc_common::config::ConfigError;
use rc_common::consts::DEFAULT_RECEIVER_CONFIG;
use rc_common::transport::RadioRegistry;
use rc_receiver::actuator::ActuatorRegistry;
use rc_receiver::config::{ReceiverConfig, load_config};
use rc_receiver::cycle::{CycleRunner, StopReason, rt_setup};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// RC Receiver: vehicle-side control loop
#[derive(Parser, Debug)]
#[command(name = "rc_receiver")]
#[command(version)]
#[command(about = "Decode RC commands and drive the vehicle outputs")]
struct Args {
    /// Path to the receiver configuration TOML.
    #[arg(default_value = DEFAULT_RECEIVER_CONFIG)]
    config: PathBuf,

    /// Force the simulation actuator regardless of the config.
    #[arg(long)]
    simulate: bool,

    /// SCHED_FIFO priority. Only takes effect with the `rt` feature.
    #[arg(long, value_name = "PRIO")]
    rt_priority: Option<i32>,

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

    info!("RC Receiver v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, loaded) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("RC Receiver shutdown complete");
}

fn run(
    args: &Args,
    loaded: Result<ReceiverConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = loaded.map_err(|e| format!("{}: {e}", args.config.display()))?;
    if args.simulate {
        config.actuator.driver = "simulation".to_string();
    }

    info!(
        service = %config.shared.service_name,
        tick_rate_hz = config.control.tick_rate_hz,
        link_timeout_ms = config.control.link_timeout_ms,
        driver = %config.actuator.driver,
        "Config OK"
    );

    if let Some(priority) = args.rt_priority {
        rt_setup(priority)?;
        info!(priority, "RT setup complete");
    }

    let radios = RadioRegistry::with_builtin();
    let actuators = ActuatorRegistry::with_builtin();
    let mut runner = CycleRunner::from_config(&config, &radios, &actuators)?;

    let running = runner.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    let reason = runner.run();
    let stats = runner.stats();
    info!(
        ?reason,
        ticks = stats.tick_count,
        avg_us = stats.avg_tick_ns() / 1000,
        overruns = stats.overruns,
        write_errors = stats.write_errors,
        "Control loop stopped"
    );
    if reason == StopReason::ShutdownRequested {
        info!("Stopped on transmitter request");
    }

    // Dropping the runner zeroes and releases the actuator.
    drop(runner);
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
