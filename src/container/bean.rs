//! Bean identity and registration types.
//!
//! These types describe beans *before* a container exists: pre-built
//! singleton instances, runtime definitions that know how to produce an
//! instance later, and the stereotype tags used to select eager
//! initialization targets.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;

/// Type-erased shared bean value.
pub type AnyBean = Arc<dyn Any + Send + Sync>;

/// Opaque, comparable identity for a bean type.
///
/// Pairs the `TypeId` (used for lookup) with the type name (used for
/// diagnostics and name-based lookup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// The key for a concrete type.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The full type name, e.g. `myapp::server::HttpServer`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn id(&self) -> TypeId {
        self.id
    }

    /// Whether `name` refers to this type, either as the full path or as
    /// a trailing path segment (`HttpServer` matches
    /// `myapp::server::HttpServer`).
    pub fn matches_name(&self, name: &str) -> bool {
        self.name == name
            || self
                .name
                .strip_suffix(name)
                .is_some_and(|prefix| prefix.ends_with("::"))
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A marker identifying a category of bean (e.g. "singleton"), used to
/// select eager-initialization targets.
///
/// The scanning collaborator is responsible for mapping constructed types
/// to these tags; within this crate they are opaque interned strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StereotypeTag(Cow<'static, str>);

impl StereotypeTag {
    /// The singleton stereotype, added by
    /// [`eager_init_singletons`](crate::builder::ContextBuilder::eager_init_singletons).
    pub fn singleton() -> Self {
        Self(Cow::Borrowed("singleton"))
    }

    /// The configuration-holder stereotype, added by
    /// [`eager_init_configuration`](crate::builder::ContextBuilder::eager_init_configuration).
    pub fn configuration() -> Self {
        Self(Cow::Borrowed("configuration"))
    }

    /// A custom stereotype tag.
    pub fn custom(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StereotypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Start/stop capability a bean may expose.
///
/// Beans registered with a lifecycle handle are activated by
/// [`run`](crate::builder::ContextBuilder::run) if not already running.
pub trait LifeCycle: Send + Sync {
    fn is_running(&self) -> bool;

    fn start(&self) -> Result<()>;

    fn stop(&self) -> Result<()> {
        Ok(())
    }
}

/// A pre-built singleton staged for registration with the container.
///
/// Holds the type-erased value and, when the bean exposes a start/stop
/// capability, a lifecycle handle to the same instance.
#[derive(Clone)]
pub struct BeanInstance {
    key: TypeKey,
    value: AnyBean,
    lifecycle: Option<Arc<dyn LifeCycle>>,
}

impl BeanInstance {
    /// Stage a plain bean with no lifecycle capability.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            value: Arc::new(value),
            lifecycle: None,
        }
    }

    /// Stage a bean that exposes a start/stop capability.
    pub fn with_lifecycle<T: Any + Send + Sync + LifeCycle>(value: T) -> Self {
        let shared = Arc::new(value);
        Self {
            key: TypeKey::of::<T>(),
            lifecycle: Some(shared.clone() as Arc<dyn LifeCycle>),
            value: shared as AnyBean,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn value(&self) -> &AnyBean {
        &self.value
    }

    /// The lifecycle handle, if this bean exposes one.
    pub fn lifecycle(&self) -> Option<&Arc<dyn LifeCycle>> {
        self.lifecycle.as_ref()
    }

    /// Downcast the value to a concrete type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for BeanInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanInstance")
            .field("key", &self.key)
            .field("lifecycle", &self.lifecycle.is_some())
            .finish()
    }
}

type Provider = Arc<dyn Fn() -> Result<Option<BeanInstance>> + Send + Sync>;

/// A runtime-constructed bean definition registered prior to startup.
///
/// The provider runs when the container instantiates the bean: eagerly at
/// build time when the definition's tags intersect the configured eager-init
/// markers, lazily on first lookup otherwise. A provider may yield no
/// instance; whether that is an error depends on the `allow_empty_providers`
/// setting.
#[derive(Clone)]
pub struct RuntimeBeanDefinition {
    key: TypeKey,
    tags: BTreeSet<StereotypeTag>,
    provider: Provider,
}

impl RuntimeBeanDefinition {
    /// A definition whose provider always produces an instance.
    pub fn new<T, F>(provider: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            key: TypeKey::of::<T>(),
            tags: BTreeSet::new(),
            provider: Arc::new(move || Ok(Some(BeanInstance::new(provider())))),
        }
    }

    /// A definition whose provider may produce no instance.
    pub fn optional<T, F>(provider: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> Option<T> + Send + Sync + 'static,
    {
        Self {
            key: TypeKey::of::<T>(),
            tags: BTreeSet::new(),
            provider: Arc::new(move || Ok(provider().map(BeanInstance::new))),
        }
    }

    /// A definition whose provider yields a fully staged [`BeanInstance`],
    /// for beans that carry a lifecycle handle.
    pub fn staged<F>(key: TypeKey, provider: F) -> Self
    where
        F: Fn() -> Result<Option<BeanInstance>> + Send + Sync + 'static,
    {
        Self {
            key,
            tags: BTreeSet::new(),
            provider: Arc::new(provider),
        }
    }

    /// Attach a stereotype tag to this definition.
    pub fn tagged(mut self, tag: StereotypeTag) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn tags(&self) -> &BTreeSet<StereotypeTag> {
        &self.tags
    }

    /// Whether any of this definition's tags appear in `markers`.
    pub fn is_tagged_any(&self, markers: &BTreeSet<StereotypeTag>) -> bool {
        self.tags.iter().any(|tag| markers.contains(tag))
    }

    /// Run the provider.
    pub fn instantiate(&self) -> Result<Option<BeanInstance>> {
        (self.provider)()
    }
}

impl fmt::Debug for RuntimeBeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeBeanDefinition")
            .field("key", &self.key)
            .field("tags", &self.tags)
            .finish()
    }
}

/// The opaque scan trigger: maps scan packages and eager-init markers to
/// additional bean definitions at container build time.
///
/// Real implementations inspect compiled-in inventories or code generation
/// output; this crate only defines the seam.
pub trait BeanLoader: Send + Sync {
    fn load(
        &self,
        packages: &BTreeSet<String>,
        eager_markers: &BTreeSet<StereotypeTag>,
    ) -> Result<Vec<RuntimeBeanDefinition>>;
}
