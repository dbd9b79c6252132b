//! dropwatch math utilities.

pub mod math;

pub use math::stable::*;
pub use math::gamma::*;
pub use math::normal::*;
pub use math::poisson::*;
pub use math::summary::*;
