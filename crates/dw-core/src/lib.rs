//! dropwatch core library
//!
//! This library provides the detection engine:
//! - Exit codes for CLI operations
//! - Configuration loading
//! - Input series handling
//! - Rate inference, the day-to-day model, and the particle filter
//! - The end-to-end detection pipeline
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod exit_codes;
pub mod inference;
pub mod logging;
pub mod pipeline;
pub mod series;
