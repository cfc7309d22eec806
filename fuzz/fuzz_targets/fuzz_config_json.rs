//! Fuzz target: configuration parsing
//!
//! Arbitrary bytes fed to the JSON config parser must either fail to parse
//! or produce a config whose validation verdict is stable across a
//! serialise/parse round trip.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use star::config::MonitorConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = serde_json::from_slice::<MonitorConfig>(data) else {
        return;
    };
    let verdict = cfg.validate().is_ok();
    if let Ok(text) = serde_json::to_string(&cfg) {
        if let Ok(again) = serde_json::from_str::<MonitorConfig>(&text) {
            assert_eq!(again.validate().is_ok(), verdict);
        }
    }
});
