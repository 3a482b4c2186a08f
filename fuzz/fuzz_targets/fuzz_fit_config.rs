//! Fuzz target for fit config parsing (TOML) and validation.

#![no_main]

use hmm_config::{validate_fit_config, FitConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Should never panic, only return an error
    if let Ok(config) = FitConfig::from_toml_str(text) {
        let _ = validate_fit_config(&config);
    }
});
