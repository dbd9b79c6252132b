//! Fuzz target for configuration parsing.
//!
//! Tests that JSON and TOML configuration parsing and validation handle
//! arbitrary input without panicking.

#![no_main]

use dw_config::validate::validate_config;
use dw_config::{ConfigFormat, DetectorConfig};
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &str| {
    for format in [ConfigFormat::Json, ConfigFormat::Toml] {
        if let Ok(config) = DetectorConfig::parse(data, format, Path::new("fuzz")) {
            let _ = validate_config(&config);
        }
    }
});
