//! Layered property precedence.
//!
//! The resolver stacks property layers from lowest to highest precedence;
//! later layers win on key collision. The container collaborator applies
//! the fixed contract order:
//!
//! 1. default property sources (if enabled), lowest precedence
//! 2. appended property sources, in call order
//! 3. environment-variable-derived properties (if enabled, filtered)
//! 4. the override property map, highest precedence

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::source::{EnvironmentPropertySource, PropertySource};
use crate::builder::ContextSnapshot;

/// A single precedence layer.
#[derive(Debug, Clone, Default)]
pub struct PropertyLayer {
    /// Layer name (for precedence diagnostics).
    pub name: String,
    /// Entries in this layer.
    pub values: HashMap<String, Value>,
}

impl PropertyLayer {
    pub fn new(name: impl Into<String>, values: HashMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Layered property resolution.
///
/// Layers are held lowest to highest precedence. The first layer pushed has
/// lowest priority, the last has highest.
#[derive(Debug, Clone, Default)]
pub struct PropertyResolver {
    layers: Vec<PropertyLayer>,
}

impl PropertyResolver {
    pub fn new() -> Self {
        Self { layers: vec![] }
    }

    /// Add a layer. Later layers take precedence.
    pub fn push_layer(&mut self, layer: PropertyLayer) {
        self.layers.push(layer);
    }

    /// Add a property source as a layer.
    pub fn push_source(&mut self, source: &dyn PropertySource) {
        self.layers
            .push(PropertyLayer::new(source.name(), source.properties()));
    }

    /// Build the contract-ordered resolver for a frozen snapshot.
    ///
    /// `defaults` are the collaborator-supplied default property sources
    /// (layer 1); `env_vars` is the environment-variable snapshot used for
    /// layer 3.
    pub fn for_snapshot(
        snapshot: &ContextSnapshot,
        defaults: &[Arc<dyn PropertySource>],
        env_vars: &HashMap<String, String>,
    ) -> Self {
        let mut resolver = Self::new();

        if snapshot.default_property_sources {
            for source in defaults {
                resolver.push_source(source.as_ref());
            }
        }

        for source in &snapshot.property_sources {
            resolver.push_source(source.as_ref());
        }

        if snapshot.environment_property_source {
            let env_source = EnvironmentPropertySource::from_vars(
                env_vars,
                &snapshot.env_var_includes,
                &snapshot.env_var_excludes,
            );
            resolver.push_source(&env_source);
        }

        resolver.push_layer(PropertyLayer::new("overrides", snapshot.properties.clone()));
        resolver
    }

    /// Resolved value for a key, from the highest-precedence layer that
    /// contains it.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.values.get(key))
    }

    /// The name of the layer a key's resolved value comes from.
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.layers
            .iter()
            .rev()
            .find(|layer| layer.values.contains_key(key))
            .map(|layer| layer.name.as_str())
    }

    /// Flatten all layers into one map, higher layers overriding lower.
    pub fn resolve(&self) -> HashMap<String, Value> {
        let mut result = HashMap::new();
        for layer in &self.layers {
            result.extend(layer.values.clone());
        }
        result
    }

    pub fn layers(&self) -> &[PropertyLayer] {
        &self.layers
    }
}
