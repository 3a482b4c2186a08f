//! Fuzz target for observation input parsing.
//!
//! Covers the nested, wrapped and concatenated shapes plus the
//! float-to-symbol conversion.

#![no_main]

use hmm_core::observations::ObservationInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = serde_json::from_slice::<ObservationInput>(data) {
        if let Ok(sequences) = input.into_sequences() {
            assert!(sequences.iter().all(|seq| !seq.is_empty()));
        }
    }
});
