//! Property sources.
//!
//! A property source is an opaque provider of key/value configuration
//! entries. Parsing property *files* is out of scope here; callers hand the
//! builder already-constructed sources. The one source this module builds
//! itself is the environment-variable source, because its filtering rules
//! (include/exclude sets, key normalization) are part of the precedence
//! contract.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

/// An opaque, named provider of configuration entries.
pub trait PropertySource: Send + Sync {
    /// Source name, used for precedence diagnostics.
    fn name(&self) -> &str;

    /// All entries this source provides.
    fn properties(&self) -> HashMap<String, Value>;

    /// Look up a single key.
    fn get(&self, key: &str) -> Option<Value> {
        self.properties().remove(key)
    }
}

/// An in-memory property source backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MapPropertySource {
    name: String,
    values: HashMap<String, Value>,
}

impl MapPropertySource {
    pub fn new(name: impl Into<String>, values: HashMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Convenience constructor from key/value pairs.
    pub fn of<K, V>(name: impl Into<String>, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            name: name.into(),
            values: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> HashMap<String, Value> {
        self.values.clone()
    }
}

/// Load the process environment as a plain map.
pub fn load_system_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Normalize an environment variable name to a property key.
///
/// `DATABASE_URL` becomes `database.url`.
pub fn normalize_env_key(name: &str) -> String {
    name.to_lowercase().replace('_', ".")
}

/// Property source derived from environment variables.
///
/// Filtering happens on the raw variable names before normalization:
/// - an empty include set admits every variable; a non-empty one admits
///   only the listed names;
/// - excludes are applied last, so an exclude beats an include on overlap.
#[derive(Debug, Clone)]
pub struct EnvironmentPropertySource {
    values: HashMap<String, Value>,
}

impl EnvironmentPropertySource {
    /// Build from the current process environment.
    pub fn new(includes: &BTreeSet<String>, excludes: &BTreeSet<String>) -> Self {
        Self::from_vars(&load_system_env(), includes, excludes)
    }

    /// Build from an explicit variable map (for testing).
    pub fn from_vars(
        vars: &HashMap<String, String>,
        includes: &BTreeSet<String>,
        excludes: &BTreeSet<String>,
    ) -> Self {
        let values = vars
            .iter()
            .filter(|(name, _)| includes.is_empty() || includes.contains(*name))
            .filter(|(name, _)| !excludes.contains(*name))
            .map(|(name, value)| (normalize_env_key(name), Value::String(value.clone())))
            .collect();
        Self { values }
    }
}

impl PropertySource for EnvironmentPropertySource {
    fn name(&self) -> &str {
        "env"
    }

    fn properties(&self) -> HashMap<String, Value> {
        self.values.clone()
    }
}
