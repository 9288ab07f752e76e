//! Accumulated builder state and its frozen snapshot.
//!
//! [`ContextOptions`] is the single mutable record behind the fluent
//! builder. Every builder call merges into it under one of four rules:
//! set-valued options union, scalar options are last-write-wins, sequence
//! options append in call order, and the override property map merges
//! right-biased. [`ContextSnapshot`] is the same data frozen at `build()`
//! time, with deduction already applied and the effective environment set
//! computed.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::container::{BeanInstance, BeanLoader, RuntimeBeanDefinition, StereotypeTag, TypeKey};
use crate::env::{DeducePolicy, EnvironmentOrigin, ResolvedEnvironments};
use crate::properties::PropertySource;

/// The accumulated configuration facts.
///
/// All fields have safe defaults; an untouched `ContextOptions` freezes
/// into a valid, buildable snapshot.
#[derive(Clone, Default)]
pub struct ContextOptions {
    /// Stereotype tags selecting eager-initialization targets. Union.
    pub eager_init_markers: BTreeSet<StereotypeTag>,
    /// Whether the collaborator's default property sources apply.
    pub default_property_sources: bool,
    /// Overridden config locations. Full replace.
    pub config_locations: Vec<String>,
    /// Pre-built singletons to register prior to startup. Append.
    pub singletons: Vec<BeanInstance>,
    /// Runtime bean definitions to register prior to startup. Append.
    pub bean_definitions: Vec<RuntimeBeanDefinition>,
    /// Local heuristic deduction policy. Last write wins.
    pub deduce_environment: DeducePolicy,
    /// Whether the cloud probe collaborator runs. Last write wins.
    pub deduce_cloud_environment: bool,
    /// Explicitly supplied environments. Union.
    pub environments: BTreeSet<String>,
    /// Environments used only if nothing else names one. Union.
    pub default_environments: BTreeSet<String>,
    /// Packages handed to the scan collaborator. Union.
    pub packages: BTreeSet<String>,
    /// Override properties, highest precedence. Right-biased merge.
    pub properties: HashMap<String, Value>,
    /// Additional property sources. Append, in call order.
    pub property_sources: Vec<Arc<dyn PropertySource>>,
    /// Whether environment variables contribute to configuration.
    pub environment_property_source: bool,
    /// Environment variables admitted to configuration. Union.
    pub env_var_includes: BTreeSet<String>,
    /// Environment variables barred from configuration. Union.
    pub env_var_excludes: BTreeSet<String>,
    /// The application's designated main type.
    pub main_class: Option<TypeKey>,
    /// The bean-definition loader collaborator.
    pub loader: Option<Arc<dyn BeanLoader>>,
    /// Configurations to include. Union.
    pub included_configurations: BTreeSet<String>,
    /// Configurations to exclude. Union.
    pub excluded_configurations: BTreeSet<String>,
    /// Whether the startup banner is printed.
    pub banner: bool,
    /// Whether a provider yielding no instance is tolerated.
    pub allow_empty_providers: bool,
    /// Raw command-line arguments, unparsed. Full replace.
    pub args: Vec<String>,
    /// Whether the bootstrap environment is initialized.
    pub bootstrap_environment: bool,
}

impl ContextOptions {
    pub fn new() -> Self {
        Self {
            default_property_sources: true,
            environment_property_source: true,
            banner: true,
            bootstrap_environment: true,
            ..Default::default()
        }
    }

    /// Freeze into a snapshot, folding the deduced environment names into
    /// the effective set.
    pub fn freeze(self, deduced: BTreeSet<String>) -> ContextSnapshot {
        let resolved =
            ResolvedEnvironments::resolve(&self.environments, &deduced, &self.default_environments);

        ContextSnapshot {
            eager_init_markers: self.eager_init_markers,
            default_property_sources: self.default_property_sources,
            config_locations: self.config_locations,
            singletons: self.singletons,
            bean_definitions: self.bean_definitions,
            environments: resolved.names,
            environment_origin: resolved.origin,
            packages: self.packages,
            properties: self.properties,
            property_sources: self.property_sources,
            environment_property_source: self.environment_property_source,
            env_var_includes: self.env_var_includes,
            env_var_excludes: self.env_var_excludes,
            main_class: self.main_class,
            loader: self.loader,
            included_configurations: self.included_configurations,
            excluded_configurations: self.excluded_configurations,
            banner: self.banner,
            allow_empty_providers: self.allow_empty_providers,
            args: self.args,
            bootstrap_environment: self.bootstrap_environment,
        }
    }
}

impl fmt::Debug for ContextOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextOptions")
            .field("eager_init_markers", &self.eager_init_markers)
            .field("environments", &self.environments)
            .field("default_environments", &self.default_environments)
            .field("packages", &self.packages)
            .field("deduce_environment", &self.deduce_environment)
            .field("deduce_cloud_environment", &self.deduce_cloud_environment)
            .field("singletons", &self.singletons.len())
            .field("bean_definitions", &self.bean_definitions.len())
            .field("property_sources", &self.property_sources.len())
            .field("properties", &self.properties.len())
            .finish_non_exhaustive()
    }
}

/// The frozen configuration handed once to the container collaborator.
///
/// The builder relinquishes ownership at `build()`; nothing mutates a
/// snapshot afterwards. Fields the core merely threads through
/// (`config_locations`, `args`, configuration filters, the bootstrap
/// toggle) are consumed by the collaborator, not here.
#[derive(Clone)]
pub struct ContextSnapshot {
    pub eager_init_markers: BTreeSet<StereotypeTag>,
    pub default_property_sources: bool,
    pub config_locations: Vec<String>,
    pub singletons: Vec<BeanInstance>,
    pub bean_definitions: Vec<RuntimeBeanDefinition>,
    /// Effective environments: union of explicit and deduced, with the
    /// defaults applied only when that union was empty.
    pub environments: BTreeSet<String>,
    pub environment_origin: EnvironmentOrigin,
    pub packages: BTreeSet<String>,
    pub properties: HashMap<String, Value>,
    pub property_sources: Vec<Arc<dyn PropertySource>>,
    pub environment_property_source: bool,
    pub env_var_includes: BTreeSet<String>,
    pub env_var_excludes: BTreeSet<String>,
    pub main_class: Option<TypeKey>,
    pub loader: Option<Arc<dyn BeanLoader>>,
    pub included_configurations: BTreeSet<String>,
    pub excluded_configurations: BTreeSet<String>,
    pub banner: bool,
    pub allow_empty_providers: bool,
    pub args: Vec<String>,
    pub bootstrap_environment: bool,
}

impl ContextSnapshot {
    /// A JSON summary for diagnostics logging.
    pub fn summary(&self) -> Value {
        json!({
            "environments": &self.environments,
            "environment_origin": self.environment_origin,
            "eager_init_markers": &self.eager_init_markers,
            "packages": &self.packages,
            "singletons": self.singletons.len(),
            "bean_definitions": self.bean_definitions.len(),
            "property_sources": self.property_sources.len(),
            "override_properties": self.properties.len(),
            "main_class": self.main_class.map(|key| key.name()),
        })
    }
}

impl fmt::Debug for ContextSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextSnapshot")
            .field("environments", &self.environments)
            .field("environment_origin", &self.environment_origin)
            .field("eager_init_markers", &self.eager_init_markers)
            .field("packages", &self.packages)
            .field("singletons", &self.singletons.len())
            .field("bean_definitions", &self.bean_definitions.len())
            .field("property_sources", &self.property_sources.len())
            .finish_non_exhaustive()
    }
}
