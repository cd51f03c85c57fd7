#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Arbitrary operator input must never panic the line parser; unknown
    // tokens are dropped.
    let _ = loadtrack_core::pump::parse_line(data);
});
