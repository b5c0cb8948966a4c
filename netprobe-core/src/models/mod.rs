//! Data models shared across the crate

mod feature;
mod target;

pub use feature::{Feature, FeatureSet};
pub use target::{AuthMethod, DEFAULT_SSH_PORT, Target};
