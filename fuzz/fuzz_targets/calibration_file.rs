#![no_main]

use ftag_calib::BinnedCalibrationProvider;
use ftag_core::{CalibrationHandle, CalibrationProvider, UncertaintyKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(provider) = BinnedCalibrationProvider::from_json_str(text) else {
        return;
    };

    // Whatever loads must answer lookups without panicking, including for
    // handles it never issued.
    for h in 0..8 {
        for (pt, eta) in [(-1.0, 0.0), (25.0, 0.3), (1e6, -4.0), (f64::NAN, 1.0)] {
            let _ = provider.lookup(CalibrationHandle(h), pt, eta, UncertaintyKind::Total);
        }
    }
});
