//! Unit conversions and elapsed-time helpers for display.

/// 1 mbar in inches of mercury.
pub const INHG_PER_MBAR: f64 = 0.02953;

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn mbar_to_inhg(mbar: f64) -> f64 {
    mbar * INHG_PER_MBAR
}

/// Round `value` up (towards +∞) to `places` decimal places.
pub fn round_up(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale).ceil() / scale
}

/// Second within the current minute (0..60).
pub fn second_of_minute(elapsed_secs: u64) -> u64 {
    elapsed_secs % 60
}

/// Minute within the current hour (0..60).
pub fn minute_of_hour(elapsed_secs: u64) -> u64 {
    (elapsed_secs / 60) % 60
}

/// Whole hours elapsed.
pub fn hours(elapsed_secs: u64) -> u64 {
    elapsed_secs / 3_600
}

/// `H:MM:SS` rendering of an elapsed time.
pub fn format_elapsed(elapsed_secs: u64) -> String {
    format!(
        "{}:{:02}:{:02}",
        hours(elapsed_secs),
        minute_of_hour(elapsed_secs),
        second_of_minute(elapsed_secs)
    )
}
