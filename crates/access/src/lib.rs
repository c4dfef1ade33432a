//! Subscription tiers and the rules deciding who may see or do what.

mod error;
mod gate;
mod highlight;
mod stats;
mod subscription;
mod tier;
mod visibility;

pub use error::*;
pub use gate::*;
pub use highlight::*;
pub use stats::*;
pub use subscription::*;
pub use tier::*;
pub use visibility::*;
