//! Integration tests for the public builder API.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use belay::builder::ContextBuilder;
use belay::container::DefaultContainerFactory;
use belay::env::DeducePolicy;
use belay::properties::MapPropertySource;
use belay::{
    BeanInstance, BelayError, CloudProbe, ContainerFactory, LifeCycle, PropertySource, Result,
    RuntimeBeanDefinition, StereotypeTag, TypeKey,
};

fn quiet() -> ContextBuilder {
    ContextBuilder::new()
        .banner(false)
        .deduce_environment(DeducePolicy::ForceOff)
}

/// Route crate logging through a test subscriber; `RUST_LOG` controls
/// verbosity.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("belay=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .ok();
}

#[test]
fn public_api_is_accessible() {
    init_tracing();
    let _builder = ContextBuilder::new();
    let _tag = StereotypeTag::singleton();
    let _key = TypeKey::of::<String>();
    let _policy = DeducePolicy::Implicit;
}

#[test]
fn full_precedence_chain() {
    // Default source says 1, appended source says 2, override says 3.
    let defaults: Vec<Arc<dyn PropertySource>> =
        vec![Arc::new(MapPropertySource::of("defaults", [("key", 1)]))];
    let factory = Arc::new(
        DefaultContainerFactory::new()
            .with_default_sources(defaults.clone())
            .with_env_vars(HashMap::new()),
    );

    let container = quiet()
        .container_factory(factory.clone())
        .property_sources([
            Arc::new(MapPropertySource::of("appended", [("key", 2)])) as Arc<dyn PropertySource>,
        ])
        .properties([("key", 3)])
        .build()
        .unwrap();
    assert_eq!(container.properties().get("key"), Some(&Value::from(3)));

    // Without the override, the appended source wins.
    let container = quiet()
        .container_factory(factory.clone())
        .property_sources([
            Arc::new(MapPropertySource::of("appended", [("key", 2)])) as Arc<dyn PropertySource>,
        ])
        .build()
        .unwrap();
    assert_eq!(container.properties().get("key"), Some(&Value::from(2)));

    // Without the appended source, the default remains.
    let container = quiet().container_factory(factory).build().unwrap();
    assert_eq!(container.properties().get("key"), Some(&Value::from(1)));
}

#[test]
fn environment_variables_contribute_between_sources_and_overrides() {
    let mut env_vars = HashMap::new();
    env_vars.insert("SERVER_PORT".to_string(), "9090".to_string());
    env_vars.insert("SECRET_KEY".to_string(), "hunter2".to_string());
    let factory = Arc::new(DefaultContainerFactory::new().with_env_vars(env_vars));

    let container = quiet()
        .container_factory(factory.clone())
        .environment_variable_excludes(["SECRET_KEY"])
        .build()
        .unwrap();
    assert_eq!(
        container.properties().get("server.port"),
        Some(&Value::from("9090"))
    );
    assert_eq!(container.properties().get("secret.key"), None);

    // The override map always wins over environment variables.
    let container = quiet()
        .container_factory(factory)
        .property("server.port", 1234)
        .build()
        .unwrap();
    assert_eq!(
        container.properties().get("server.port"),
        Some(&Value::from(1234))
    );
}

#[test]
fn deduced_environment_suppresses_defaults() {
    struct FixedProbe;
    impl CloudProbe for FixedProbe {
        fn probe(&self) -> BTreeSet<String> {
            let mut set = BTreeSet::new();
            set.insert("gcp".to_string());
            set
        }
    }

    // Deduction yields nothing: defaults apply.
    let container = quiet().default_environments(["dev"]).build().unwrap();
    let expected: BTreeSet<String> = ["dev".to_string()].into_iter().collect();
    assert_eq!(container.snapshot().environments, expected);

    // The cloud probe yields a name even with heuristics forced off,
    // and that single name suppresses the defaults.
    let container = quiet()
        .default_environments(["dev"])
        .deduce_cloud_environment(true)
        .cloud_probe(Arc::new(FixedProbe))
        .build()
        .unwrap();
    let expected: BTreeSet<String> = ["gcp".to_string()].into_iter().collect();
    assert_eq!(container.snapshot().environments, expected);
}

#[test]
fn call_order_among_independent_options_does_not_matter() {
    let a = quiet()
        .environments(["a", "b"])
        .packages(["pkg"])
        .eager_init_configuration(true)
        .freeze_check();
    let b = quiet()
        .eager_init_configuration(true)
        .packages(["pkg"])
        .environments(["b", "a"])
        .freeze_check();
    assert_eq!(a, b);
}

trait FreezeCheck {
    fn freeze_check(self) -> (BTreeSet<String>, BTreeSet<String>, usize);
}

impl FreezeCheck for ContextBuilder {
    fn freeze_check(self) -> (BTreeSet<String>, BTreeSet<String>, usize) {
        let options = self.options();
        (
            options.environments.clone(),
            options.packages.clone(),
            options.eager_init_markers.len(),
        )
    }
}

#[test]
fn run_couples_lookup_with_activation() {
    struct Worker {
        running: AtomicBool,
    }
    impl LifeCycle for Worker {
        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }
        fn start(&self) -> Result<()> {
            self.running.store(true, Ordering::SeqCst);
            Ok(())
        }
        fn stop(&self) -> Result<()> {
            self.running.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    let (container, worker) = quiet()
        .singletons([BeanInstance::with_lifecycle(Worker {
            running: AtomicBool::new(false),
        })])
        .run::<Worker>()
        .unwrap();
    assert!(container.is_running());
    assert!(worker.is_running());
}

#[test]
fn run_named_resolves_by_short_name() {
    struct Greeter;

    let (_container, instance) = quiet().singleton(Greeter).run_named("Greeter").unwrap();
    assert!(instance.downcast::<Greeter>().is_some());
}

#[test]
fn run_named_rejects_empty_name() {
    let result = quiet().run_named("  ");
    assert!(matches!(result, Err(BelayError::InvalidArgument { .. })));
}

#[test]
fn collaborator_failure_propagates_unwrapped() {
    struct FailingFactory;
    impl ContainerFactory for FailingFactory {
        fn create(&self, _snapshot: belay::ContextSnapshot) -> Result<Box<dyn belay::Container>> {
            Err(anyhow::anyhow!("unreadable property source").into())
        }
    }

    let result = quiet().container_factory(Arc::new(FailingFactory)).build();
    match result {
        Err(BelayError::Other(err)) => assert!(err.to_string().contains("unreadable")),
        Err(other) => panic!("expected propagated collaborator error, got {other}"),
        Ok(_) => panic!("expected propagated collaborator error"),
    }
}

#[test]
fn eager_definitions_initialize_during_build() {
    static BUILT: AtomicBool = AtomicBool::new(false);

    struct Holder;

    quiet()
        .eager_init_configuration(true)
        .bean_definitions([RuntimeBeanDefinition::new(|| {
            BUILT.store(true, Ordering::SeqCst);
            Holder
        })
        .tagged(StereotypeTag::configuration())])
        .build()
        .unwrap();
    assert!(BUILT.load(Ordering::SeqCst));
}
