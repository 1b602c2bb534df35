//! # EXO Safety Supervisor
//!
//! Binary entry point: loads `supervisor.toml`, initializes tracing,
//! wires the configured port backends, starts the telemetry uploader
//! thread and enters the safety loop. The loop never returns; power-off
//! is the only exit.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{info, trace};
use tracing_subscriber::EnvFilter;

use exo_common::config::{ConfigError, ConfigLoader, DriverKind, SupervisorConfig};
use exo_common::consts::{ENVELOPE_SIGNED, NODE_ID};
use exo_hal::clock::MonotonicClock;
use exo_hal::drivers::sim::{SimActuators, SimLoadSensors, SimSecondaryBus, SimSecureElement, SimWorld};
use exo_hal::link::SecondaryLink;
use exo_supervisor::audit::AuditSink;
use exo_supervisor::supervisor::Supervisor;
use exo_supervisor::telemetry::TelemetryQueue;

#[derive(Debug, Parser)]
#[command(name = "exo_supervisor", about = "Safety supervisor for the EXO support suit")]
struct Cli {
    /// Directory containing supervisor.toml; built-in defaults apply when omitted.
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

fn main() -> Result<(), ConfigError> {
    let cli = Cli::parse();
    let config = match &cli.config_dir {
        Some(dir) => SupervisorConfig::load(&dir.join("supervisor.toml"))?,
        None => SupervisorConfig::default(),
    };
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.supervisor.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        node = NODE_ID,
        driver = ?config.supervisor.driver,
        "exo supervisor starting"
    );

    let queue = TelemetryQueue::new();
    spawn_uploader(queue.clone());

    match config.supervisor.driver {
        DriverKind::Simulation => run_simulation(&config, queue),
        DriverKind::I2c => run_i2c(&config, queue),
    }
}

/// Drain the telemetry queue on its own schedule. Stands in for the fleet
/// uploader, which is an external collaborator with its own transport.
fn spawn_uploader(queue: TelemetryQueue) {
    thread::Builder::new()
        .name("telemetry-uploader".into())
        .spawn(move || {
            loop {
                while let Some(payload) = queue.pop() {
                    let signed = payload.first() == Some(&ENVELOPE_SIGNED);
                    trace!(len = payload.len(), signed, "telemetry payload drained");
                }
                thread::sleep(Duration::from_millis(200));
            }
        })
        .expect("spawn telemetry uploader");
}

/// Full in-memory port set with the configured steady-state load profile.
fn run_simulation(config: &SupervisorConfig, queue: TelemetryQueue) -> ! {
    let sim = &config.sim;
    let world = SimWorld::shared(sim.load_left, sim.load_right, sim.accel_z, sim.mirror_skew);

    let audit = AuditSink::new(NODE_ID, SimSecureElement::new(), queue);
    let mut supervisor = Supervisor::new(
        MonotonicClock::new(),
        SimLoadSensors::new(world.clone()),
        SecondaryLink::new(SimSecondaryBus::new(world)),
        SimActuators::new(),
        audit,
    );
    supervisor.boot();
    supervisor.run()
}

/// HIL port set: i2c-dev secondary link and sysfs GPIO actuators. Load
/// sensors stay simulated until the board ADC driver lands, and records
/// go out unsigned until a secure element is provisioned.
#[cfg(feature = "linux-hw")]
fn run_i2c(config: &SupervisorConfig, queue: TelemetryQueue) -> ! {
    use std::path::Path;

    use exo_hal::drivers::linux::{I2cDevBus, SysfsGpioActuators};

    // validate() guarantees both sections exist for this driver.
    let i2c = config.i2c.as_ref().expect("validated i2c section");
    let gpio = config.gpio.as_ref().expect("validated gpio section");

    let bus = match I2cDevBus::open(Path::new(&i2c.bus)) {
        Ok(bus) => bus,
        Err(err) => {
            tracing::error!(%err, bus = %i2c.bus, "cannot open I2C bus");
            std::process::exit(1);
        }
    };

    let sim = &config.sim;
    let world = SimWorld::shared(sim.load_left, sim.load_right, sim.accel_z, sim.mirror_skew);

    let audit = AuditSink::new(NODE_ID, SimSecureElement::unavailable(), queue);
    let mut supervisor = Supervisor::new(
        MonotonicClock::new(),
        SimLoadSensors::new(world),
        SecondaryLink::new(bus),
        SysfsGpioActuators::new(&gpio.mech_release, &gpio.descent),
        audit,
    );
    supervisor.boot();
    supervisor.run()
}

#[cfg(not(feature = "linux-hw"))]
fn run_i2c(_config: &SupervisorConfig, _queue: TelemetryQueue) -> ! {
    eprintln!("driver = \"i2c\" requires a build with the linux-hw feature");
    std::process::exit(2);
}
