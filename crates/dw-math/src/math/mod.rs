//! Core math modules.

pub mod stable;
pub mod gamma;
pub mod normal;
pub mod poisson;
pub mod summary;
