//! Environment deduction and resolution.
//!
//! - Local heuristics and cloud probing in [`deduction`]
//! - The fallback-only-when-empty resolution rule in [`resolver`]

pub mod deduction;
pub mod resolver;

pub use deduction::{CloudProbe, DeducePolicy, EnvironmentDeducer, ENVIRONMENTS_VAR};
pub use resolver::{EnvironmentOrigin, ResolvedEnvironments};
