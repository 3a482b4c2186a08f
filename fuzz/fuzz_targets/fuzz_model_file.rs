//! Fuzz target for model file parsing and validation.
//!
//! Any input must either be rejected with an error or yield a model that
//! scores a short sequence without panicking.

#![no_main]

use hmm_core::model_file::ModelFile;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(file) = ModelFile::from_json_str(text) else {
        return;
    };
    if let Ok(model) = file.into_model() {
        let obs = vec![0usize; 4];
        let _ = model.score(&[obs.as_slice()]);
    }
});
