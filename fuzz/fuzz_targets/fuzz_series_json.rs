//! Fuzz target for the input series document.
//!
//! Tests that parsing, windowing, ranking, and forward filling handle
//! arbitrary input without panicking.

#![no_main]

use dw_core::series::{forward_fill, SeriesSet};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let Ok(set) = SeriesSet::from_json(data) else {
        return;
    };
    let _ = set.largest(50);
    let windowed = set.window(7);
    for key in windowed.keys() {
        if let Ok(raw) = windowed.get(key) {
            let _ = forward_fill(key, raw);
        }
    }
});
