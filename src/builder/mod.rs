//! The fluent bootstrap builder and its accumulated state.
//!
//! - Option accumulation and the build/start handoff in [`context_builder`]
//! - The mutable state record and its frozen snapshot in [`options`]
//!
//! # Merge Rules
//!
//! - Set-valued options union: commutative, idempotent, never a replacement
//! - Scalar options are last-write-wins, in caller invocation order
//! - Sequence options append in call order
//! - The override property map merges right-biased

pub mod context_builder;
pub mod options;

pub use context_builder::ContextBuilder;
pub use options::{ContextOptions, ContextSnapshot};
