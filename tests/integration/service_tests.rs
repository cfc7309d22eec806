//! `MonitorService` one cycle at a time against the simulated barometer
//! and GPIO.

use std::sync::Arc;

use star::adapters::log_sink::VecEventSink;
use star::adapters::sim_gpio::SimGpio;
use star::app::commands::AppCommand;
use star::app::events::AppEvent;
use star::app::ports::Level;
use star::app::service::MonitorService;
use star::config::MonitorConfig;
use star::counter::cps_to_dose_rate;
use star::events::Anomaly;
use star::fsm::StateId;
use star::pins;
use star::sensors::compensation::{self, STANDARD_QFF_MBAR};
use star::sensors::sim::{SimBarometerHandle, DATASHEET_COEFFICIENTS, DATASHEET_D1};
use star::sensors::{Calibration, RawSample};
use star::shared::{handle_edge, SharedState};

use crate::mock_hw::{fly_to, sim_barometer, SimBaro};

struct Rig {
    service: MonitorService<SimBaro>,
    baro: SimBarometerHandle,
    gpio: Arc<SimGpio>,
    shared: Arc<SharedState>,
    sink: VecEventSink,
    elapsed: u64,
}

impl Rig {
    fn new(config: MonitorConfig) -> Self {
        let gpio = Arc::new(SimGpio::new());
        let shared = Arc::new(SharedState::new(&config, gpio.clone()).unwrap());
        let (barometer, baro) = sim_barometer();
        let mut service = MonitorService::new(config, barometer, shared.clone());
        let mut sink = VecEventSink::new();
        service.start(&mut sink);
        Self {
            service,
            baro,
            gpio,
            shared,
            sink,
            elapsed: 0,
        }
    }

    /// Fly to `altitude_m` and run one cycle.
    fn second_at(&mut self, altitude_m: f64) -> star::app::events::SecondRecord {
        fly_to(&self.baro, altitude_m, STANDARD_QFF_MBAR);
        self.elapsed += 1;
        self.service.step(self.elapsed, &mut self.sink)
    }

    /// Run one cycle without touching the barometer.
    fn second_at_current_pressure(&mut self) -> star::app::events::SecondRecord {
        self.elapsed += 1;
        self.service.step(self.elapsed, &mut self.sink)
    }

    /// `n` well-separated pulses, each with a 200 µs dead time, inside the
    /// second in progress.
    fn pulses(&self, n: u64) {
        let base = self.elapsed * 1_000_000_000 + 1_000;
        for i in 0..n {
            let t = base + i * 10_000_000;
            handle_edge(&self.shared, t);
            handle_edge(&self.shared, t + 200_000);
        }
    }
}

fn threshold_config(post_secs: u32) -> MonitorConfig {
    MonitorConfig {
        geiger_alt_m: 100.0,
        dead_band_m: 10.0,
        post_duration_secs: post_secs,
        ..MonitorConfig::default()
    }
}

#[test]
fn hv_follows_altitude_with_hysteresis() {
    let mut rig = Rig::new(threshold_config(0));
    let hv: Vec<bool> = [50.0, 80.0, 105.0, 95.0, 91.0]
        .into_iter()
        .map(|a| {
            rig.second_at(a);
            rig.service.hv_on()
        })
        .collect();
    assert_eq!(hv, vec![false, false, true, true, true]);
    assert_eq!(rig.gpio.level(pins::HV_GATE_PIN), Some(Level::High));

    rig.second_at(88.0);
    assert!(!rig.service.hv_on());
    assert_eq!(rig.service.state(), StateId::HvOffBelowThreshold);
    assert_eq!(rig.gpio.level(pins::HV_GATE_PIN), Some(Level::Low));
}

#[test]
fn record_altitude_tracks_barometer() {
    let mut rig = Rig::new(threshold_config(0));
    let rec = rig.second_at(1_234.0);
    let alt = rec.altitude_m.unwrap();
    assert!((alt - 1_234.0).abs() < 0.5, "alt = {alt}");
    let baro = rec.barometer.unwrap();
    assert!((baro.temperature_c - 20.002_283).abs() < 1e-5);
}

#[test]
fn counts_are_not_applicable_while_hv_off() {
    let mut rig = Rig::new(threshold_config(0));
    rig.pulses(3);
    let rec = rig.second_at(10.0);
    assert_eq!(rec.counts, None);
    assert!(!rec.hv_on);
    assert_eq!(rec.dose_rate_usv_h, None);
    // Dead time is still measured.
    assert_eq!(rec.dead_counts, 3);

    // Climb: HV switches on at the end of this second.
    rig.second_at(500.0);
    rig.pulses(4);
    let rec = rig.second_at(500.0);
    assert!(rec.hv_on);
    assert_eq!(rec.counts, Some(4));
    assert_eq!(rec.dead_counts, 4);
    assert!((rec.dead_time_s - 4.0 * 200e-6).abs() < 1e-12);
}

#[test]
fn record_covers_the_closed_second() {
    let mut rig = Rig::new(threshold_config(0));
    let first = rig.second_at(500.0);
    assert_eq!(first.elapsed_secs, 0);
    let second = rig.second_at(500.0);
    assert_eq!(second.elapsed_secs, 1);
    assert_eq!(rig.service.second_index(), 2);
}

#[test]
fn dose_rate_over_trailing_window() {
    let config = MonitorConfig {
        dose_window_secs: 3,
        ..threshold_config(0)
    };
    let factor = config.tube_conversion_factor;
    let mut rig = Rig::new(config);
    rig.second_at(500.0);
    assert!(rig.service.hv_on());

    let mut last = None;
    for _ in 0..4 {
        rig.pulses(2);
        last = rig.second_at(500.0).dose_rate_usv_h;
    }
    let dose = last.unwrap();
    assert!((dose - cps_to_dose_rate(2.0, factor)).abs() < 1e-12, "dose = {dose}");
}

#[test]
fn dose_rate_is_not_diluted_while_history_fills() {
    let config = threshold_config(0);
    let factor = config.tube_conversion_factor;
    let mut rig = Rig::new(config);
    rig.second_at(500.0);
    assert!(rig.service.hv_on());

    let rates: Vec<f64> = (0..3)
        .map(|_| {
            rig.pulses(2);
            rig.second_at(500.0).dose_rate_usv_h.unwrap()
        })
        .collect();
    let expected = cps_to_dose_rate(2.0, factor);
    for rate in rates {
        assert!((rate - expected).abs() < 1e-12, "rate = {rate}");
    }
}

#[test]
fn dose_rate_ignores_seconds_counted_with_hv_off() {
    let config = threshold_config(0);
    let factor = config.tube_conversion_factor;
    let mut rig = Rig::new(config);
    // Background hits while the tube is unpowered on the ground.
    rig.pulses(9);
    rig.second_at(500.0);
    rig.pulses(1);
    let rec = rig.second_at(500.0);
    assert_eq!(rec.counts, Some(1));
    let dose = rec.dose_rate_usv_h.unwrap();
    assert!((dose - cps_to_dose_rate(1.0, factor)).abs() < 1e-12, "dose = {dose}");
}

#[test]
fn cold_sensor_uses_first_order_temperature_for_altitude() {
    let mut rig = Rig::new(threshold_config(0));
    rig.baro.set_raw(DATASHEET_D1, 7_000_000);
    let rec = rig.second_at_current_pressure();

    let cal = Calibration::from_coefficients_unchecked(DATASHEET_COEFFICIENTS);
    let r = compensation::compensate(
        &cal,
        RawSample {
            temperature: 7_000_000,
            pressure: DATASHEET_D1,
        },
    );
    assert!(r.t1 < -15.0 && r.t2 < r.t1 - 1.0);

    let baro = rec.barometer.unwrap();
    assert!((baro.temperature_c - r.t1).abs() < 1e-9);
    assert!((baro.temperature2_c - r.t2).abs() < 1e-9);
    let expected = compensation::altitude(r.p2, r.t1, STANDARD_QFF_MBAR).unwrap();
    let alt = rec.altitude_m.unwrap();
    assert!((alt - expected).abs() < 1e-9, "alt = {alt}, expected {expected}");
}

#[test]
fn ground_start_runs_post_once() {
    let mut rig = Rig::new(threshold_config(3));
    let mut hv = Vec::new();
    for _ in 0..6 {
        rig.second_at(5.0);
        hv.push(rig.service.hv_on());
    }
    assert_eq!(hv, vec![true, true, true, false, false, false]);

    let switches: Vec<bool> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::HvSwitched(on) => Some(*on),
            _ => None,
        })
        .collect();
    assert_eq!(switches, vec![true, false]);
}

#[test]
fn forced_post_is_refused_once_post_has_run() {
    let mut rig = Rig::new(threshold_config(2));
    for _ in 0..4 {
        rig.second_at(5.0);
    }
    assert_eq!(rig.service.state(), StateId::HvOffBelowThreshold);

    rig.service
        .handle_command(AppCommand::ForceState(StateId::PostActive), &mut rig.sink);
    assert_eq!(rig.service.state(), StateId::HvOffBelowThreshold);
    assert!(!rig.service.hv_on());
}

#[test]
fn forced_post_runs_while_still_pending() {
    let mut rig = Rig::new(threshold_config(5));
    rig.service
        .handle_command(AppCommand::ForceState(StateId::PostActive), &mut rig.sink);
    assert_eq!(rig.service.state(), StateId::PostActive);
    assert!(rig.service.hv_on());
}

#[test]
fn sensor_fault_holds_state_and_reports() {
    let mut rig = Rig::new(threshold_config(0));
    rig.second_at(500.0);
    assert!(rig.service.hv_on());

    rig.baro.set_failing(true);
    let rec = rig.second_at(0.0);
    assert_eq!(rec.barometer, None);
    assert_eq!(rec.altitude_m, None);
    assert!(rig.service.hv_on());
    assert!(rig
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::SensorFault(_))));

    rig.baro.set_failing(false);
    rig.second_at(0.0);
    assert!(!rig.service.hv_on());
}

#[test]
fn anomalies_are_drained_into_the_sink() {
    let mut rig = Rig::new(threshold_config(0));
    handle_edge(&rig.shared, 5_000);
    handle_edge(&rig.shared, 4_000);
    rig.second_at(10.0);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::Anomaly(Anomaly::ClockAnomaly { t1_ns: 5_000, now_ns: 4_000 })
    )));
}

#[test]
fn force_state_switches_hv_immediately() {
    let mut rig = Rig::new(threshold_config(0));
    rig.service
        .handle_command(AppCommand::ForceState(StateId::HvOnAboveThreshold), &mut rig.sink);
    assert!(rig.service.hv_on());
    rig.service.shutdown(&mut rig.sink);
    assert!(!rig.service.hv_on());
}

#[test]
fn recompute_qff_uses_current_sample() {
    let mut rig = Rig::new(threshold_config(0));
    assert!((rig.service.qff() - STANDARD_QFF_MBAR).abs() < f64::EPSILON);
    rig.baro.set_pressure_mbar(1_000.0);
    rig.service.handle_command(AppCommand::RecomputeQff, &mut rig.sink);
    let qff = rig.service.qff();
    assert!(qff > 1_005.0 && qff < 1_006.5, "qff = {qff}");
    assert!(rig
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::QffSet(_))));
}

#[test]
fn shutdown_command_stops_the_loop_flag() {
    let mut rig = Rig::new(threshold_config(0));
    rig.service.handle_command(AppCommand::Shutdown, &mut rig.sink);
    assert!(!rig.shared.is_running());
}
