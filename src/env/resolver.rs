//! Active-environment resolution.
//!
//! The effective set is the union of explicitly supplied and deduced
//! environments. Only when that union is empty do the configured defaults
//! apply; a default never suppresses an explicit or deduced name, even a
//! single one.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Where the effective environment set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnvironmentOrigin {
    /// Explicitly supplied only.
    Explicit,
    /// Deduced only.
    Deduced,
    /// Union of explicit and deduced names.
    Combined,
    /// Fallback to the configured defaults.
    Defaults,
    /// No named environments are active.
    None,
}

impl fmt::Display for EnvironmentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::Deduced => write!(f, "deduced"),
            Self::Combined => write!(f, "explicit + deduced"),
            Self::Defaults => write!(f, "defaults"),
            Self::None => write!(f, "none"),
        }
    }
}

/// The resolved environment set with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEnvironments {
    pub names: BTreeSet<String>,
    pub origin: EnvironmentOrigin,
}

impl ResolvedEnvironments {
    /// Apply the fallback-only-when-empty rule.
    pub fn resolve(
        explicit: &BTreeSet<String>,
        deduced: &BTreeSet<String>,
        defaults: &BTreeSet<String>,
    ) -> Self {
        let origin = match (explicit.is_empty(), deduced.is_empty()) {
            (false, false) => EnvironmentOrigin::Combined,
            (false, true) => EnvironmentOrigin::Explicit,
            (true, false) => EnvironmentOrigin::Deduced,
            (true, true) if !defaults.is_empty() => EnvironmentOrigin::Defaults,
            (true, true) => EnvironmentOrigin::None,
        };

        let names = match origin {
            EnvironmentOrigin::Defaults => defaults.clone(),
            EnvironmentOrigin::None => BTreeSet::new(),
            _ => explicit.union(deduced).cloned().collect(),
        };

        Self { names, origin }
    }
}
