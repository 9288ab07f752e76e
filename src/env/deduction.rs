//! Environment deduction.
//!
//! Deduces active environment names from process context. Two independent
//! mechanisms exist:
//!
//! - **local heuristics**: cheap environment-variable checks (Kubernetes,
//!   Heroku, Cloud Foundry, AWS Lambda) plus the `BELAY_ENVIRONMENTS`
//!   override variable, gated by [`DeducePolicy`];
//! - **cloud probing**: a potentially expensive collaborator
//!   ([`CloudProbe`]) that may hit the network or disk, gated by its own
//!   toggle.
//!
//! The two toggles are orthogonal: forcing local heuristics off does not
//! suppress cloud probing.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

/// Whether local heuristic deduction runs.
///
/// `Implicit` is the runtime's default behavior (heuristics enabled);
/// `ForceOn` and `ForceOff` pin it explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeducePolicy {
    #[default]
    Implicit,
    ForceOn,
    ForceOff,
}

impl DeducePolicy {
    /// Whether local heuristics run under this policy.
    pub fn heuristics_enabled(self) -> bool {
        !matches!(self, DeducePolicy::ForceOff)
    }
}

/// Collaborator performing extended cloud platform identification.
///
/// Implementations may perform network or disk probes; nothing in this
/// crate does. Returns the environment names the probe established,
/// possibly empty.
pub trait CloudProbe: Send + Sync {
    fn probe(&self) -> BTreeSet<String>;
}

/// Override variable naming active environments directly, comma-separated.
pub const ENVIRONMENTS_VAR: &str = "BELAY_ENVIRONMENTS";

/// Variables that mark a known deployment platform, with the environment
/// names their presence establishes.
const DEDUCTION_RULES: &[(&str, &[&str])] = &[
    ("KUBERNETES_SERVICE_HOST", &["k8s", "cloud"]),
    ("DYNO", &["heroku", "cloud"]),
    ("VCAP_SERVICES", &["pcf", "cloud"]),
    ("AWS_LAMBDA_FUNCTION_NAME", &["function"]),
];

/// Runs environment deduction at build time.
#[derive(Clone, Default)]
pub struct EnvironmentDeducer {
    cloud_probe: Option<Arc<dyn CloudProbe>>,
}

impl EnvironmentDeducer {
    pub fn new() -> Self {
        Self { cloud_probe: None }
    }

    /// Attach a cloud probe collaborator.
    pub fn with_cloud_probe(mut self, probe: Arc<dyn CloudProbe>) -> Self {
        self.cloud_probe = Some(probe);
        self
    }

    /// Deduce environment names from the current process environment.
    pub fn deduce(&self, policy: DeducePolicy, cloud: bool) -> BTreeSet<String> {
        self.deduce_with_env(policy, cloud, |key| std::env::var(key))
    }

    /// Deduce with a custom env var lookup (for testing).
    pub fn deduce_with_env<F>(&self, policy: DeducePolicy, cloud: bool, env_fn: F) -> BTreeSet<String>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let mut deduced = BTreeSet::new();

        if policy.heuristics_enabled() {
            if let Ok(named) = env_fn(ENVIRONMENTS_VAR) {
                deduced.extend(
                    named
                        .split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(String::from),
                );
            }

            for (var, names) in DEDUCTION_RULES {
                if env_fn(var).is_ok() {
                    deduced.extend(names.iter().map(|name| name.to_string()));
                }
            }
        }

        // Cloud probing is orthogonal to the heuristic policy.
        if cloud {
            if let Some(probe) = &self.cloud_probe {
                deduced.extend(probe.probe());
            }
        }

        if !deduced.is_empty() {
            debug!(environments = ?deduced, "deduced environments");
        }
        deduced
    }
}

impl std::fmt::Debug for EnvironmentDeducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentDeducer")
            .field("cloud_probe", &self.cloud_probe.is_some())
            .finish()
    }
}
