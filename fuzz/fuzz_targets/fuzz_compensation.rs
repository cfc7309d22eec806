//! Fuzz target: MS5607 compensation and altitude
//!
//! Arbitrary calibration words and ADC codes must never panic, and the
//! altitude path must return either a finite number or a typed error.
//!
//! cargo fuzz run fuzz_compensation

#![no_main]

use libfuzzer_sys::fuzz_target;
use star::sensors::calibration::{seal, PROM_WORDS};
use star::sensors::compensation;
use star::sensors::{Calibration, RawSample};

fuzz_target!(|data: &[u8]| {
    if data.len() < PROM_WORDS * 2 + 8 {
        return;
    }
    let mut words = [0u16; PROM_WORDS];
    for (i, w) in words.iter_mut().enumerate() {
        *w = u16::from_be_bytes([data[2 * i], data[2 * i + 1]]);
    }
    // Sealed words always validate.
    let cal = Calibration::from_words(seal(words)).expect("sealed PROM must validate");

    let rest = &data[PROM_WORDS * 2..];
    let d1 = u32::from_be_bytes([0, rest[0], rest[1], rest[2]]);
    let d2 = u32::from_be_bytes([0, rest[3], rest[4], rest[5]]);
    let qff = f64::from(u16::from_be_bytes([rest[6], rest[7]])) / 10.0;

    let r = compensation::compensate(&cal, RawSample { temperature: d2, pressure: d1 });
    assert!(r.t2 <= r.t1);
    if let Ok(h) = compensation::altitude(r.p2, r.t1, qff) {
        assert!(h.is_finite());
    }
});
