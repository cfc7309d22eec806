//! Barometer pipeline: SPI command layer → driver → compensation → altitude.

use star::app::ports::BarometerPort;
use star::error::SetupError;
use star::sensors::compensation::{self, STANDARD_QFF_MBAR};
use star::sensors::sim::{DATASHEET_COEFFICIENTS, DATASHEET_D1, DATASHEET_D2};
use star::sensors::spi::SpiTransport;
use star::sensors::{Ms5607, Osr};

use crate::mock_hw::{pressure_for_altitude, Ms5607Chip, NoDelay};

fn chip() -> Ms5607Chip {
    Ms5607Chip::new(DATASHEET_COEFFICIENTS, DATASHEET_D1, DATASHEET_D2)
}

#[test]
fn setup_resets_then_reads_every_prom_word() {
    let baro = Ms5607::setup(SpiTransport::new(chip()), NoDelay, Osr::X256, Osr::X4096).unwrap();
    let (transport, _) = baro.release();
    let commands = transport.into_inner().commands;
    assert_eq!(
        commands,
        vec![0x1E, 0xA0, 0xA2, 0xA4, 0xA6, 0xA8, 0xAA, 0xAC, 0xAE]
    );
}

#[test]
fn corrupted_prom_fails_setup() {
    let mut c = chip();
    c.prom[3] ^= 0x0100;
    let err = Ms5607::setup(SpiTransport::new(c), NoDelay, Osr::X256, Osr::X4096)
        .err()
        .unwrap();
    assert!(matches!(err, SetupError::CalibrationCrc { .. }));
}

#[test]
fn raw_read_uses_configured_oversampling() {
    let mut baro =
        Ms5607::setup(SpiTransport::new(chip()), NoDelay, Osr::X1024, Osr::X2048).unwrap();
    let raw = baro.read_raw().unwrap();
    assert_eq!(raw.pressure, DATASHEET_D1);
    assert_eq!(raw.temperature, DATASHEET_D2);

    let (transport, _) = baro.release();
    let commands = transport.into_inner().commands;
    // After the PROM reads: pressure conversion, read, temperature conversion, read.
    assert_eq!(&commands[9..], &[0x44, 0x00, 0x56, 0x00]);
}

#[test]
fn datasheet_part_compensates_to_datasheet_values() {
    let mut baro =
        Ms5607::setup(SpiTransport::new(chip()), NoDelay, Osr::X256, Osr::X4096).unwrap();
    let raw = baro.read_raw().unwrap();
    let r = compensation::compensate(baro.calibration(), raw);
    assert!((r.dt - 68.0).abs() < 1e-9);
    assert!((r.t1 - 20.002_283).abs() < 1e-5);
    assert!((r.p1 - 1_100.029_576).abs() < 1e-5);
    assert!((r.p2 - r.p1).abs() < 1e-12);

    // 1100 mbar is below standard QFF: the sensor sits below sea level.
    let h = compensation::altitude(r.p2, r.t1, STANDARD_QFF_MBAR).unwrap();
    assert!(h < -600.0 && h > -800.0, "h = {h}");
}

#[test]
fn altitude_inverts_pressure_helper() {
    for target in [0.0, 150.0, 1_000.0, 10_000.0, 30_000.0] {
        let p = pressure_for_altitude(target, 20.0, 1013.25);
        let h = compensation::altitude(p, 20.0, 1013.25).unwrap();
        assert!((h - target).abs() < 1e-6, "{target} -> {h}");
    }
}
