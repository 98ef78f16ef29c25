//! Domain models for the WaveGuard hazard risk platform

mod assessment;
mod earthquake;
mod location;
mod rainfall;
mod weather;

pub use assessment::*;
pub use earthquake::*;
pub use location::*;
pub use rainfall::*;
pub use weather::*;
