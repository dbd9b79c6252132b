//! Fuzz target for `--taps` parsing.

#![no_main]

use dw_config::TapSet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(taps) = TapSet::parse(data) {
        // A parsed set is non-empty, sorted, and round-trips through Display.
        assert!(!taps.is_empty());
        assert_eq!(TapSet::parse(&taps.to_string()).ok(), Some(taps));
    }
});
