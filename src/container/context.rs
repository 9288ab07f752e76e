//! Container construction and the build/start handoff surface.
//!
//! The builder's only downstream contract is [`ContainerFactory`]: a frozen
//! [`ContextSnapshot`] goes in, a constructed-but-unstarted [`Container`]
//! comes out. [`DefaultContainer`] is the minimal in-crate implementation
//! of that contract; a real dependency-injection runtime supplies its own
//! factory and ignores it.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use super::bean::{BeanInstance, RuntimeBeanDefinition, TypeKey};
use crate::builder::ContextSnapshot;
use crate::error::{BelayError, Result};
use crate::properties::{load_system_env, PropertyResolver, PropertySource};

/// A constructed runtime container.
///
/// Returned unstarted from [`ContainerFactory::create`]; `start` activates
/// it. Bean lookup is by type identity or by type name.
pub trait Container: Send + Sync {
    fn start(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    fn is_running(&self) -> bool;

    /// Fetch a bean by type identity, instantiating it if necessary.
    fn get_bean(&self, key: &TypeKey) -> Result<BeanInstance>;

    /// Fetch a bean by full type path or trailing path segment.
    fn get_bean_named(&self, name: &str) -> Result<BeanInstance>;

    /// The frozen configuration this container was built from.
    fn snapshot(&self) -> &ContextSnapshot;

    /// The resolved property precedence stack.
    fn properties(&self) -> &PropertyResolver;
}

/// The single downstream call the builder makes: construct a container
/// from a frozen configuration snapshot.
pub trait ContainerFactory: Send + Sync {
    fn create(&self, snapshot: ContextSnapshot) -> Result<Box<dyn Container>>;
}

const BANNER: &str = r"
 _          _
| |__   ___| | __ _ _   _
| '_ \ / _ \ |/ _` | | | |
| |_) |  __/ | (_| | |_| |
|_.__/ \___|_|\__,_|\__, |
                    |___/
";

/// Minimal container honoring the snapshot contract.
///
/// Registers explicit singletons, runtime definitions, and loader-scanned
/// definitions; eager-initializes definitions whose tags intersect the
/// configured markers; resolves properties through the contract-ordered
/// [`PropertyResolver`].
pub struct DefaultContainer {
    snapshot: ContextSnapshot,
    definitions: Vec<RuntimeBeanDefinition>,
    instances: Mutex<HashMap<TypeId, BeanInstance>>,
    properties: PropertyResolver,
    running: bool,
}

impl DefaultContainer {
    fn create(snapshot: ContextSnapshot, properties: PropertyResolver) -> Result<Self> {
        let mut definitions = snapshot.bean_definitions.clone();
        if let Some(loader) = &snapshot.loader {
            let scanned = loader.load(&snapshot.packages, &snapshot.eager_init_markers)?;
            debug!(count = scanned.len(), "loader contributed bean definitions");
            definitions.extend(scanned);
        }

        let mut instances = HashMap::new();
        for singleton in &snapshot.singletons {
            instances.insert(singleton.key().id(), singleton.clone());
        }

        let container = Self {
            snapshot,
            definitions,
            instances: Mutex::new(instances),
            properties,
            running: false,
        };

        // Eager initialization happens at build time so failures surface
        // before the container is handed back.
        for definition in &container.eager_definitions() {
            container.instantiate(definition)?;
        }

        Ok(container)
    }

    fn eager_definitions(&self) -> Vec<RuntimeBeanDefinition> {
        self.definitions
            .iter()
            .filter(|def| def.is_tagged_any(&self.snapshot.eager_init_markers))
            .cloned()
            .collect()
    }

    fn instantiate(&self, definition: &RuntimeBeanDefinition) -> Result<Option<BeanInstance>> {
        match definition.instantiate()? {
            Some(instance) => {
                self.lock_instances()
                    .insert(instance.key().id(), instance.clone());
                Ok(Some(instance))
            }
            None if self.snapshot.allow_empty_providers => Ok(None),
            None => Err(BelayError::BeanCreation {
                type_name: definition.key().name().to_string(),
                message: "provider produced no instance".to_string(),
            }),
        }
    }

    fn lock_instances(&self) -> std::sync::MutexGuard<'_, HashMap<TypeId, BeanInstance>> {
        self.instances.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Container for DefaultContainer {
    fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        if self.snapshot.banner {
            info!("{BANNER}");
        }
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environments = ?self.snapshot.environments,
            origin = %self.snapshot.environment_origin,
            "container started"
        );
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let instances = self.lock_instances();
        for instance in instances.values() {
            if let Some(lifecycle) = instance.lifecycle() {
                if lifecycle.is_running() {
                    lifecycle.stop()?;
                }
            }
        }
        drop(instances);
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn get_bean(&self, key: &TypeKey) -> Result<BeanInstance> {
        if let Some(instance) = self.lock_instances().get(&key.id()) {
            return Ok(instance.clone());
        }

        let definition = self
            .definitions
            .iter()
            .find(|def| def.key() == *key)
            .cloned();
        if let Some(definition) = definition {
            if let Some(instance) = self.instantiate(&definition)? {
                return Ok(instance);
            }
        }

        Err(BelayError::NoSuchBean {
            type_name: key.name().to_string(),
        })
    }

    fn get_bean_named(&self, name: &str) -> Result<BeanInstance> {
        let found = self
            .lock_instances()
            .values()
            .find(|instance| instance.key().matches_name(name))
            .cloned();
        if let Some(instance) = found {
            return Ok(instance);
        }

        let definition = self
            .definitions
            .iter()
            .find(|def| def.key().matches_name(name))
            .cloned();
        if let Some(definition) = definition {
            if let Some(instance) = self.instantiate(&definition)? {
                return Ok(instance);
            }
        }

        Err(BelayError::NoSuchBean {
            type_name: name.to_string(),
        })
    }

    fn snapshot(&self) -> &ContextSnapshot {
        &self.snapshot
    }

    fn properties(&self) -> &PropertyResolver {
        &self.properties
    }
}

/// Default container-construction collaborator.
///
/// Default property sources and the environment-variable snapshot are
/// injectable so precedence can be exercised deterministically in tests;
/// absent injection the live process environment is used.
#[derive(Default)]
pub struct DefaultContainerFactory {
    default_sources: Vec<Arc<dyn PropertySource>>,
    env_vars: Option<HashMap<String, String>>,
}

impl DefaultContainerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the default property sources (precedence layer 1).
    pub fn with_default_sources(mut self, sources: Vec<Arc<dyn PropertySource>>) -> Self {
        self.default_sources = sources;
        self
    }

    /// Use an explicit environment-variable map instead of the process
    /// environment.
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env_vars = Some(vars);
        self
    }
}

impl ContainerFactory for DefaultContainerFactory {
    fn create(&self, snapshot: ContextSnapshot) -> Result<Box<dyn Container>> {
        let env_vars = match &self.env_vars {
            Some(vars) => vars.clone(),
            None => load_system_env(),
        };
        let properties = PropertyResolver::for_snapshot(&snapshot, &self.default_sources, &env_vars);
        let container = DefaultContainer::create(snapshot, properties)?;
        Ok(Box::new(container))
    }
}
