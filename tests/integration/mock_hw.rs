//! Mock hardware for integration tests.
//!
//! An SPI-level MS5607 emulation, a no-op delay, a fast-forward clock and
//! helpers that turn a target altitude into a barometer setting.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{ErrorType, Operation, SpiDevice};

use star::app::ports::ClockPort;
use star::sensors::calibration::seal;
use star::sensors::compensation::{GAS_CONSTANT, GRAVITY, KELVIN_OFFSET, SEA_LEVEL_TEMP_K};
use star::sensors::sim::{SimBarometerHandle, SimTransport};
use star::sensors::{Ms5607, Osr};

// ── Delay ─────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── Simulated barometer ───────────────────────────────────────

pub type SimBaro = Ms5607<SimTransport, NoDelay>;

/// Datasheet part behind the in-memory transport.
pub fn sim_barometer() -> (SimBaro, SimBarometerHandle) {
    let (transport, handle) = SimTransport::datasheet();
    let baro = Ms5607::setup(transport, NoDelay, Osr::X256, Osr::X4096).unwrap();
    (baro, handle)
}

/// Temperature the datasheet D2 compensates to (°C).
pub const DATASHEET_TEMP_C: f64 = 20.002_283;

/// Pressure at which the barometric formula yields `altitude_m`.
pub fn pressure_for_altitude(altitude_m: f64, temp_c: f64, qff_mbar: f64) -> f64 {
    let mean_temp_k = (SEA_LEVEL_TEMP_K + temp_c + KELVIN_OFFSET) / 2.0;
    qff_mbar / (altitude_m / ((GAS_CONSTANT / GRAVITY) * mean_temp_k)).exp()
}

/// Point the simulated barometer at `altitude_m` for the given QFF.
pub fn fly_to(handle: &SimBarometerHandle, altitude_m: f64, qff_mbar: f64) {
    handle.set_pressure_mbar(pressure_for_altitude(altitude_m, DATASHEET_TEMP_C, qff_mbar));
}

// ── SPI-level MS5607 ──────────────────────────────────────────

/// Emulates the MS5607 command set on an SPI bus.
pub struct Ms5607Chip {
    pub prom: [u16; 8],
    pub d1: u32,
    pub d2: u32,
    pub commands: Vec<u8>,
    pending: Option<u32>,
    out: VecDeque<u8>,
}

#[allow(dead_code)]
impl Ms5607Chip {
    pub fn new(coefficients: [u16; 8], d1: u32, d2: u32) -> Self {
        Self {
            prom: seal(coefficients),
            d1,
            d2,
            commands: Vec::new(),
            pending: None,
            out: VecDeque::new(),
        }
    }

    fn command(&mut self, cmd: u8) {
        self.commands.push(cmd);
        match cmd {
            0x1E => {
                self.pending = None;
            }
            0xA0..=0xAE => {
                let word = self.prom[usize::from((cmd - 0xA0) / 2)];
                self.out.extend(word.to_be_bytes());
            }
            0x40..=0x48 => self.pending = Some(self.d1),
            0x50..=0x58 => self.pending = Some(self.d2),
            0x00 => {
                let value = self.pending.take().unwrap_or(0);
                self.out.extend(&value.to_be_bytes()[1..]);
            }
            _ => {}
        }
    }
}

impl ErrorType for Ms5607Chip {
    type Error = Infallible;
}

impl SpiDevice for Ms5607Chip {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        self.out.clear();
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some(&cmd) = bytes.first() {
                        self.command(cmd);
                    }
                }
                Operation::Read(buf) | Operation::TransferInPlace(buf) => {
                    for b in buf.iter_mut() {
                        *b = self.out.pop_front().unwrap_or(0);
                    }
                }
                Operation::Transfer(read, write) => {
                    if let Some(&cmd) = write.first() {
                        self.command(cmd);
                    }
                    for b in read.iter_mut() {
                        *b = self.out.pop_front().unwrap_or(0);
                    }
                }
                Operation::DelayNs(_) => {}
            }
        }
        Ok(())
    }
}

// ── Fast-forward clock ────────────────────────────────────────

/// Each `sleep_until_next_second` advances one simulated second after a
/// short real pause.
pub struct FastClock {
    elapsed: AtomicU64,
    pause: Duration,
}

#[allow(dead_code)]
impl FastClock {
    pub fn new(pause: Duration) -> Self {
        Self {
            elapsed: AtomicU64::new(0),
            pause,
        }
    }
}

impl ClockPort for FastClock {
    fn now_ns(&self) -> u64 {
        self.elapsed.load(Ordering::Acquire) * 1_000_000_000 + 1
    }

    fn elapsed_secs(&self) -> u64 {
        self.elapsed.load(Ordering::Acquire)
    }

    fn sleep_until_next_second(&self) {
        std::thread::sleep(self.pause);
        self.elapsed.fetch_add(1, Ordering::AcqRel);
    }
}
