//! `Monitor` end to end: setup, the 1 Hz loop on a fast-forward clock,
//! edges through the GPIO callback, commands and shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use star::adapters::log_sink::VecEventSink;
use star::adapters::sim_gpio::SimGpio;
use star::app::commands::AppCommand;
use star::app::events::AppEvent;
use star::app::ports::{ClockPort, Level};
use star::config::MonitorConfig;
use star::error::{Error, SetupError};
use star::fsm::StateId;
use star::pins;
use star::runtime::Monitor;
use star::sensors::sim::SimTransport;
use star::sensors::{Ms5607, Osr};

use crate::mock_hw::{fly_to, sim_barometer, FastClock, NoDelay};

fn wait_for(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn setup_attaches_pulse_callback_and_sets_qff() {
    let gpio = Arc::new(SimGpio::new());
    let clock = Arc::new(FastClock::new(Duration::from_millis(1)));
    let (baro, _handle) = sim_barometer();
    let monitor = Monitor::setup(MonitorConfig::default(), baro, gpio.clone(), clock).unwrap();

    assert!(gpio.has_callback(pins::GEIGER_PIN));
    assert_eq!(gpio.level(pins::HV_GATE_PIN), Some(Level::Low));
    assert!(!monitor.hv_on());
    // Datasheet part reads 1100 mbar; reduced to sea level it is higher.
    let qff = monitor.service().qff();
    assert!(qff > 1_100.0 && qff < 1_110.0, "qff = {qff}");
}

#[test]
fn invalid_config_fails_setup() {
    let config = MonitorConfig {
        ring_len_secs: 0,
        ..MonitorConfig::default()
    };
    let (baro, _handle) = sim_barometer();
    let err = Monitor::setup(
        config,
        baro,
        Arc::new(SimGpio::new()),
        Arc::new(FastClock::new(Duration::ZERO)),
    )
    .err()
    .unwrap();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn gpio_failure_is_a_setup_error() {
    let gpio = Arc::new(SimGpio::new());
    gpio.set_write_failing(true);
    let (baro, _handle) = sim_barometer();
    let err = Monitor::setup(
        MonitorConfig::default(),
        baro,
        gpio,
        Arc::new(FastClock::new(Duration::ZERO)),
    )
    .err()
    .unwrap();
    assert!(matches!(err, Error::Setup(SetupError::Gpio(_))));
}

#[test]
fn bad_calibration_never_reaches_the_loop() {
    let (transport, _handle) = SimTransport::datasheet();
    let corrupted = transport.with_prom_word(2, 0x1234);
    let err = Ms5607::setup(corrupted, NoDelay, Osr::X256, Osr::X4096)
        .err()
        .unwrap();
    assert!(matches!(err, SetupError::CalibrationCrc { .. }));
}

#[test]
fn loop_runs_counts_and_stops_with_hv_off() {
    let config = MonitorConfig {
        geiger_alt_m: 100.0,
        dead_band_m: 10.0,
        post_duration_secs: 0,
        ..MonitorConfig::default()
    };
    let gpio = Arc::new(SimGpio::new());
    let clock = Arc::new(FastClock::new(Duration::from_millis(20)));
    let (baro, handle) = sim_barometer();
    let mut monitor = Monitor::setup(config, baro, gpio.clone(), clock.clone()).unwrap();
    let qff = monitor.service().qff();
    fly_to(&handle, 1_000.0, qff);

    let stop = monitor.stop_handle();
    let runner = std::thread::spawn(move || {
        let mut sink = VecEventSink::new();
        monitor.run(&mut sink).unwrap();
        sink
    });

    // Wait for HV on, then inject one pulse pair per simulated second.
    wait_for(|| gpio.level(pins::HV_GATE_PIN) == Some(Level::High));
    let start = clock.elapsed_secs();
    let mut last = start;
    while clock.elapsed_secs() < start + 4 {
        let now = clock.elapsed_secs();
        if now != last {
            let t = clock.now_ns() + 1_000;
            gpio.fire_edge(pins::GEIGER_PIN, t);
            gpio.fire_edge(pins::GEIGER_PIN, t + 300_000);
            last = now;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    stop.stop();
    let sink = runner.join().unwrap();

    assert!(matches!(sink.events.first(), Some(AppEvent::Started(StateId::AwaitingAltitude))));
    assert!(matches!(sink.events.last(), Some(AppEvent::Stopped)));
    assert_eq!(gpio.level(pins::HV_GATE_PIN), Some(Level::Low));
    assert_eq!(gpio.level(pins::LED_PIN), Some(Level::Low));

    let counted: u32 = sink.records().filter_map(|r| r.counts).sum();
    assert!(counted >= 1, "no counts recorded");
    assert!(sink.records().any(|r| r.dead_counts >= 1));
    assert!(sink
        .records()
        .all(|r| r.altitude_m.is_some_and(|a| (a - 1_000.0).abs() < 1.0)));
}

#[test]
fn shutdown_command_exits_loop() {
    let gpio = Arc::new(SimGpio::new());
    let clock = Arc::new(FastClock::new(Duration::from_millis(5)));
    let (baro, _handle) = sim_barometer();
    let mut monitor = Monitor::setup(MonitorConfig::default(), baro, gpio, clock).unwrap();
    let commands = monitor.command_sender();
    commands.send(AppCommand::Shutdown).unwrap();

    let mut sink = VecEventSink::new();
    monitor.run(&mut sink).unwrap();
    assert!(matches!(sink.events.last(), Some(AppEvent::Stopped)));
    assert_eq!(sink.records().count(), 0);
}
