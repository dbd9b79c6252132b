//! dropwatch common types, IDs, and errors.
//!
//! This crate provides foundational types shared across dw-core modules:
//! - Particle, step, tap, and entity identity types
//! - The unified error type with stable codes

pub mod error;
pub mod id;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use id::{EntityKey, ParticleId, Step, Tap};
