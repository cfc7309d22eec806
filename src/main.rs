//! STAR monitor: host simulation entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  SimTransport+Ms5607  SimGpio    MonotonicClock  LogEventSink│
//! │  (BarometerPort)      (GpioPort) (ClockPort)     (EventSink) │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ MonitorService: FSM · QFF · records                    │  │
//! │  │ SharedState:    counter · HV · indicator · anomalies   │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `star [config.json] [run_seconds]`.  A background thread flies
//! a simulated ascent: it lowers the barometer's pressure and injects
//! pulse edge pairs at a rate that grows with altitude.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use star::adapters::config_file::JsonConfigFile;
use star::adapters::log_sink::LogEventSink;
use star::adapters::sim_gpio::SimGpio;
use star::adapters::time::{MonotonicClock, StdDelay};
use star::app::ports::{ClockPort, ConfigPort};
use star::config::MonitorConfig;
use star::pins;
use star::runtime::Monitor;
use star::sensors::compensation::{GAS_CONSTANT, GRAVITY, KELVIN_OFFSET, SEA_LEVEL_TEMP_K};
use star::sensors::sim::{SimBarometerHandle, SimTransport};
use star::sensors::Ms5607;
use star::units;

/// Default simulated run length (s).
const DEFAULT_RUN_SECS: u64 = 120;
/// Seconds on the ground before the simulated launch.
const GROUND_SECS: f64 = 20.0;
/// Simulated ascent rate (m/s).
const ASCENT_RATE: f64 = 5.0;
/// Simulated tube pulse width (ns).
const PULSE_WIDTH_NS: u64 = 200_000;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => JsonConfigFile::new(path)
            .load()
            .map_err(anyhow::Error::new)
            .context("loading config")?,
        None => MonitorConfig::default(),
    };
    let run_secs = match args.next() {
        Some(s) => s.parse().context("run_seconds must be an integer")?,
        None => DEFAULT_RUN_SECS,
    };

    info!("STAR monitor starting (simulation, {run_secs}s)");

    let (transport, baro) = SimTransport::datasheet();
    let sensor = Ms5607::setup(
        transport,
        StdDelay,
        config.pressure_osr(),
        config.temperature_osr(),
    )
    .map_err(anyhow::Error::new)
    .context("barometer setup")?;

    let gpio = Arc::new(SimGpio::new());
    let clock = Arc::new(MonotonicClock::new());
    let ground_mbar = 1100.0;
    baro.set_pressure_mbar(ground_mbar);

    let mut monitor = Monitor::setup(config, sensor, gpio.clone(), clock.clone())
        .map_err(anyhow::Error::new)
        .context("monitor setup")?;
    info!(
        "QFF {:.2} mbar ({:.2} inHg)",
        monitor.service().qff(),
        units::mbar_to_inhg(monitor.service().qff())
    );

    let stop = monitor.stop_handle();
    let flight = std::thread::Builder::new()
        .name("flight-sim".into())
        .spawn(move || fly(&gpio, &clock, &baro, ground_mbar, run_secs, &stop))
        .context("spawning flight simulator")?;

    let mut sink = LogEventSink::new();
    monitor.run(&mut sink).map_err(anyhow::Error::new)?;

    if flight.join().is_err() {
        anyhow::bail!("flight simulator panicked");
    }
    info!("STAR monitor exited cleanly");
    Ok(())
}

/// Drive the simulated ascent until `run_secs` have elapsed, then stop the
/// monitor.
fn fly(
    gpio: &SimGpio,
    clock: &MonotonicClock,
    baro: &SimBarometerHandle,
    ground_mbar: f64,
    run_secs: u64,
    stop: &star::runtime::StopHandle,
) {
    let ground_temp_c = 20.0;
    let scale_height =
        (GAS_CONSTANT / GRAVITY) * (SEA_LEVEL_TEMP_K + ground_temp_c + KELVIN_OFFSET) / 2.0;

    let mut last_edge = 0u64;
    while clock.elapsed_secs() < run_secs {
        let t = clock.uptime().as_secs_f64();
        let altitude = ((t - GROUND_SECS) * ASCENT_RATE).max(0.0);
        baro.set_pressure_mbar(ground_mbar * (-altitude / scale_height).exp());

        // Roughly one pulse per 100 ms on the ground, more aloft.
        let pulses = 1 + (altitude / 200.0) as u64;
        for _ in 0..pulses {
            let falling = clock.now_ns().max(last_edge + 1);
            let rising = falling + PULSE_WIDTH_NS;
            gpio.fire_edge(pins::GEIGER_PIN, falling);
            gpio.fire_edge(pins::GEIGER_PIN, rising);
            last_edge = rising;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    stop.stop();
}
