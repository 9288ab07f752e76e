//! The fluent bootstrap configuration builder.
//!
//! `ContextBuilder` collects configuration intent through a chain of
//! accumulator calls and hands the frozen result, once, to the
//! container-construction collaborator. Every mutator consumes the builder
//! and returns it, so a chain reads naturally and a built builder cannot
//! be touched again: `build()` takes ownership, which makes post-build
//! mutation a compile error rather than a runtime fault.
//!
//! # Example
//!
//! ```
//! use belay::builder::ContextBuilder;
//!
//! let container = ContextBuilder::new()
//!     .environments(["test"])
//!     .property("server.port", 0)
//!     .banner(false)
//!     .build()
//!     .unwrap();
//! assert!(container.snapshot().environments.contains("test"));
//! ```

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::options::ContextOptions;
use crate::container::{
    BeanInstance, BeanLoader, Container, ContainerFactory, DefaultContainerFactory,
    RuntimeBeanDefinition, StereotypeTag, TypeKey,
};
use crate::env::{CloudProbe, DeducePolicy, EnvironmentDeducer};
use crate::error::{BelayError, Result};
use crate::properties::PropertySource;

/// Staged, mutable-until-sealed description of how a dependency container
/// should be assembled and started.
///
/// Accumulator calls never validate argument content and never fail; all
/// deferred work (scanning, parsing, probing) happens inside the
/// collaborator invoked by [`build`](Self::build). Calls that accept a
/// collection treat an empty one as a no-op.
pub struct ContextBuilder {
    options: ContextOptions,
    deducer: EnvironmentDeducer,
    factory: Option<Arc<dyn ContainerFactory>>,
}

impl std::fmt::Debug for ContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("options", &self.options)
            .field("deducer", &self.deducer)
            .field("custom_factory", &self.factory.is_some())
            .finish()
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            options: ContextOptions::new(),
            deducer: EnvironmentDeducer::new(),
            factory: None,
        }
    }

    /// The accumulated options (for inspection).
    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    // --- set-valued options: union, commutative, idempotent ---

    /// Eager-initialize beans carrying any of the given stereotype tags.
    pub fn eager_init_tagged(mut self, tags: impl IntoIterator<Item = StereotypeTag>) -> Self {
        self.options.eager_init_markers.extend(tags);
        self
    }

    /// Whether configuration-holder beans are eagerly initialized.
    ///
    /// Sugar for adding [`StereotypeTag::configuration`]; `false` is a
    /// no-op and never removes a tag added elsewhere.
    pub fn eager_init_configuration(self, enabled: bool) -> Self {
        if enabled {
            self.eager_init_tagged([StereotypeTag::configuration()])
        } else {
            self
        }
    }

    /// Whether singleton beans are eagerly initialized.
    ///
    /// Sugar for adding [`StereotypeTag::singleton`]; `false` is a no-op.
    pub fn eager_init_singletons(self, enabled: bool) -> Self {
        if enabled {
            self.eager_init_tagged([StereotypeTag::singleton()])
        } else {
            self
        }
    }

    /// The environments to use.
    pub fn environments<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.environments.extend(names.into_iter().map(Into::into));
        self
    }

    /// The environments to use if no other environments are specified.
    pub fn default_environments<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options
            .default_environments
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// The packages to include for scanning.
    pub fn packages<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.packages.extend(names.into_iter().map(Into::into));
        self
    }

    /// Which environment variables should contribute to configuration.
    pub fn environment_variable_includes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options
            .env_var_includes
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Which environment variables should not contribute to configuration.
    pub fn environment_variable_excludes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options
            .env_var_excludes
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Configurations to include when loading.
    pub fn include<I, S>(mut self, configurations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options
            .included_configurations
            .extend(configurations.into_iter().map(Into::into));
        self
    }

    /// Configurations to exclude when loading.
    pub fn exclude<I, S>(mut self, configurations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options
            .excluded_configurations
            .extend(configurations.into_iter().map(Into::into));
        self
    }

    // --- sequence options: append in call order ---

    /// Additional singletons to register prior to startup.
    pub fn singletons(mut self, beans: impl IntoIterator<Item = BeanInstance>) -> Self {
        self.options.singletons.extend(beans);
        self
    }

    /// Register a single pre-built singleton.
    pub fn singleton<T: Any + Send + Sync>(self, bean: T) -> Self {
        self.singletons([BeanInstance::new(bean)])
    }

    /// Register additional runtime bean definitions prior to startup.
    pub fn bean_definitions(
        mut self,
        definitions: impl IntoIterator<Item = RuntimeBeanDefinition>,
    ) -> Self {
        self.options.bean_definitions.extend(definitions);
        self
    }

    /// Additional property sources, appended in call order.
    pub fn property_sources(
        mut self,
        sources: impl IntoIterator<Item = Arc<dyn PropertySource>>,
    ) -> Self {
        self.options.property_sources.extend(sources);
        self
    }

    // --- map option: right-biased merge ---

    /// Properties to override from the environment. New keys overwrite old.
    pub fn properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.options
            .properties
            .extend(properties.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Override a single property.
    pub fn property(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties([(key, value)])
    }

    // --- scalar options: last write wins ---

    /// How active environments are deduced from local heuristics.
    pub fn deduce_environment(mut self, policy: DeducePolicy) -> Self {
        self.options.deduce_environment = policy;
        self
    }

    /// Whether the cloud probe collaborator runs. Orthogonal to
    /// [`deduce_environment`](Self::deduce_environment); probing happens
    /// even with local heuristics forced off.
    pub fn deduce_cloud_environment(mut self, enabled: bool) -> Self {
        self.options.deduce_cloud_environment = enabled;
        self
    }

    /// Whether the collaborator's default property sources are enabled.
    pub fn enable_default_property_sources(mut self, enabled: bool) -> Self {
        self.options.default_property_sources = enabled;
        self
    }

    /// Whether environment variables contribute to configuration.
    pub fn environment_property_source(mut self, enabled: bool) -> Self {
        self.options.environment_property_source = enabled;
        self
    }

    /// Whether the startup banner is printed.
    pub fn banner(mut self, enabled: bool) -> Self {
        self.options.banner = enabled;
        self
    }

    /// Whether a bean provider yielding no instance is tolerated.
    pub fn allow_empty_providers(mut self, allowed: bool) -> Self {
        self.options.allow_empty_providers = allowed;
        self
    }

    /// Whether the bootstrap environment is initialized.
    pub fn bootstrap_environment(mut self, enabled: bool) -> Self {
        self.options.bootstrap_environment = enabled;
        self
    }

    /// The application's designated main type.
    pub fn main_class(mut self, key: TypeKey) -> Self {
        self.options.main_class = Some(key);
        self
    }

    /// The bean-definition loader collaborator.
    pub fn loader(mut self, loader: Arc<dyn BeanLoader>) -> Self {
        self.options.loader = Some(loader);
        self
    }

    /// Override the default config locations. Replaces any earlier
    /// override; an empty collection leaves the current value unchanged.
    pub fn override_config_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let locations: Vec<String> = locations.into_iter().map(Into::into).collect();
        if !locations.is_empty() {
            self.options.config_locations = locations;
        }
        self
    }

    /// Set the command-line arguments, unparsed. Replaces any earlier
    /// value; an empty collection leaves the current value unchanged.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if !args.is_empty() {
            self.options.args = args;
        }
        self
    }

    // --- collaborator injection ---

    /// Use a specific container-construction collaborator instead of
    /// [`DefaultContainerFactory`].
    pub fn container_factory(mut self, factory: Arc<dyn ContainerFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Attach a cloud probe used when cloud deduction is enabled.
    pub fn cloud_probe(mut self, probe: Arc<dyn CloudProbe>) -> Self {
        self.deducer = self.deducer.with_cloud_probe(probe);
        self
    }

    // --- handoff ---

    /// Freeze the accumulated configuration and construct the container,
    /// without starting it.
    ///
    /// Deduction runs here; the collaborator receives the snapshot with
    /// the effective environment set already computed. Collaborator
    /// failures propagate unmodified.
    pub fn build(self) -> Result<Box<dyn Container>> {
        let deduced = self.deducer.deduce(
            self.options.deduce_environment,
            self.options.deduce_cloud_environment,
        );
        let snapshot = self.options.freeze(deduced);
        debug!(snapshot = %snapshot.summary(), "configuration frozen");

        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(DefaultContainerFactory::new()));
        factory.create(snapshot)
    }

    /// Build the container and start it.
    pub fn start(self) -> Result<Box<dyn Container>> {
        let mut container = self.build()?;
        container.start()?;
        Ok(container)
    }

    /// Start the container and fetch a bean of type `T` from it.
    ///
    /// If the bean exposes a lifecycle handle and is not already running,
    /// it is started before being returned; callers must expect `run` to
    /// have side effects beyond simple lookup.
    pub fn run<T: Any + Send + Sync>(self) -> Result<(Box<dyn Container>, Arc<T>)> {
        let key = TypeKey::of::<T>();
        let container = self.start()?;
        let instance = container.get_bean(&key)?;
        activate(&instance)?;
        let bean = instance.downcast::<T>().ok_or_else(|| BelayError::NoSuchBean {
            type_name: key.name().to_string(),
        })?;
        Ok((container, bean))
    }

    /// Start the container and fetch a bean by type name.
    ///
    /// `name` may be a full type path or its trailing segment. An empty
    /// name raises [`BelayError::InvalidArgument`] before any container is
    /// built; this is the only validation the builder performs itself.
    pub fn run_named(self, name: &str) -> Result<(Box<dyn Container>, BeanInstance)> {
        if name.trim().is_empty() {
            return Err(BelayError::InvalidArgument {
                name: "type".to_string(),
                message: "a bean type name is required".to_string(),
            });
        }
        let container = self.start()?;
        let instance = container.get_bean_named(name)?;
        activate(&instance)?;
        Ok((container, instance))
    }

    #[cfg(test)]
    pub(crate) fn freeze_for_test(self) -> super::options::ContextSnapshot {
        self.options.freeze(Default::default())
    }
}

/// Start a bean's lifecycle handle if it has one and is not running.
fn activate(instance: &BeanInstance) -> Result<()> {
    if let Some(lifecycle) = instance.lifecycle() {
        if !lifecycle.is_running() {
            lifecycle.start()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ContextSnapshot;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn set_options_union_across_calls() {
        let builder = ContextBuilder::new()
            .environments(["a", "b"])
            .environments(["b", "c"]);
        assert_eq!(builder.options().environments, set(&["a", "b", "c"]));

        let reversed = ContextBuilder::new()
            .environments(["b", "c"])
            .environments(["a", "b"]);
        assert_eq!(reversed.options().environments, set(&["a", "b", "c"]));
    }

    #[test]
    fn scalar_options_are_last_write_wins() {
        let builder = ContextBuilder::new().banner(true).banner(false);
        assert!(!builder.options().banner);

        let builder = ContextBuilder::new().banner(false).banner(true);
        assert!(builder.options().banner);
    }

    #[test]
    fn eager_init_sugar_is_idempotent() {
        let builder = ContextBuilder::new()
            .eager_init_singletons(true)
            .eager_init_singletons(true);
        assert_eq!(builder.options().eager_init_markers.len(), 1);
        assert!(builder
            .options()
            .eager_init_markers
            .contains(&StereotypeTag::singleton()));
    }

    #[test]
    fn eager_init_false_does_not_remove_tags() {
        let builder = ContextBuilder::new()
            .eager_init_singletons(true)
            .eager_init_singletons(false);
        assert!(builder
            .options()
            .eager_init_markers
            .contains(&StereotypeTag::singleton()));
    }

    #[test]
    fn empty_collection_calls_are_no_ops() {
        let builder = ContextBuilder::new()
            .environments(Vec::<String>::new())
            .packages(Vec::<String>::new())
            .singletons([])
            .property_sources([]);
        assert!(builder.options().environments.is_empty());
        assert!(builder.options().packages.is_empty());
        assert!(builder.options().singletons.is_empty());
        assert!(builder.options().property_sources.is_empty());
    }

    #[test]
    fn properties_merge_right_biased() {
        let builder = ContextBuilder::new()
            .properties([("a", 1), ("b", 2)])
            .properties([("b", 3), ("c", 4)]);
        let props = &builder.options().properties;
        assert_eq!(props["a"], Value::from(1));
        assert_eq!(props["b"], Value::from(3));
        assert_eq!(props["c"], Value::from(4));
    }

    #[test]
    fn config_locations_replace_fully() {
        let builder = ContextBuilder::new()
            .override_config_locations(["a.yml", "b.yml"])
            .override_config_locations(["c.yml"]);
        assert_eq!(builder.options().config_locations, vec!["c.yml"]);
    }

    #[test]
    fn empty_config_locations_call_keeps_previous_value() {
        let builder = ContextBuilder::new()
            .override_config_locations(["a.yml"])
            .override_config_locations(Vec::<String>::new());
        assert_eq!(builder.options().config_locations, vec!["a.yml"]);
    }

    #[test]
    fn args_replace_fully() {
        let builder = ContextBuilder::new().args(["--old"]).args(["--new", "-v"]);
        assert_eq!(builder.options().args, vec!["--new", "-v"]);
    }

    #[test]
    fn singletons_append_in_call_order() {
        let builder = ContextBuilder::new().singleton(1u32).singleton("two");
        let keys: Vec<_> = builder
            .options()
            .singletons
            .iter()
            .map(|b| b.key())
            .collect();
        assert_eq!(keys, vec![TypeKey::of::<u32>(), TypeKey::of::<&str>()]);
    }

    #[test]
    fn defaults_build_without_any_calls() {
        let container = ContextBuilder::new().build().unwrap();
        assert!(!container.is_running());
    }

    #[test]
    fn run_named_empty_name_fails_before_build() {
        struct PanicFactory;
        impl ContainerFactory for PanicFactory {
            fn create(&self, _snapshot: ContextSnapshot) -> Result<Box<dyn Container>> {
                panic!("factory must not be invoked");
            }
        }

        let result = ContextBuilder::new()
            .container_factory(Arc::new(PanicFactory))
            .run_named("");
        assert!(matches!(
            result,
            Err(BelayError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn custom_factory_receives_frozen_snapshot() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        struct CountingFactory;
        impl ContainerFactory for CountingFactory {
            fn create(&self, snapshot: ContextSnapshot) -> Result<Box<dyn Container>> {
                CALLS.fetch_add(1, Ordering::SeqCst);
                assert_eq!(snapshot.environments, {
                    let mut s = BTreeSet::new();
                    s.insert("test".to_string());
                    s
                });
                DefaultContainerFactory::new().create(snapshot)
            }
        }

        let container = ContextBuilder::new()
            .environments(["test"])
            .deduce_environment(DeducePolicy::ForceOff)
            .container_factory(Arc::new(CountingFactory))
            .build()
            .unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert!(container.snapshot().environments.contains("test"));
    }

    #[test]
    fn start_leaves_container_running() {
        let container = ContextBuilder::new()
            .banner(false)
            .deduce_environment(DeducePolicy::ForceOff)
            .start()
            .unwrap();
        assert!(container.is_running());
    }

    #[test]
    fn run_fetches_and_activates_the_bean() {
        use crate::container::LifeCycle;
        use std::sync::atomic::AtomicBool;

        struct Service {
            running: AtomicBool,
        }
        impl LifeCycle for Service {
            fn is_running(&self) -> bool {
                self.running.load(Ordering::SeqCst)
            }
            fn start(&self) -> Result<()> {
                self.running.store(true, Ordering::SeqCst);
                Ok(())
            }
        }

        let (_container, service) = ContextBuilder::new()
            .banner(false)
            .deduce_environment(DeducePolicy::ForceOff)
            .singletons([BeanInstance::with_lifecycle(Service {
                running: AtomicBool::new(false),
            })])
            .run::<Service>()
            .unwrap();
        assert!(service.is_running());
    }

    #[test]
    fn run_missing_bean_reports_no_such_bean() {
        struct Ghost;
        let result = ContextBuilder::new()
            .banner(false)
            .deduce_environment(DeducePolicy::ForceOff)
            .run::<Ghost>();
        assert!(matches!(result, Err(BelayError::NoSuchBean { .. })));
    }
}
