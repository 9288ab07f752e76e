//! Belay - staged bootstrap configuration builder for a
//! dependency-injection runtime.
//!
//! Belay collects configuration intent — active environments, property
//! sources and their precedence, eager-initialization targets,
//! pre-registered beans, and how the process environment is probed — and
//! hands that intent, frozen, to a container-construction collaborator.
//! The builder defines the accumulation model and ordering contract; the
//! container itself, property-file parsing, and real cloud probes are
//! external collaborators behind traits.
//!
//! # Modules
//!
//! - [`builder`] - The fluent builder, its state record, and the frozen snapshot
//! - [`container`] - Bean types and the container collaborator surface
//! - [`env`] - Environment deduction and the resolution fallback rule
//! - [`error`] - Error types and result aliases
//! - [`properties`] - Property sources and layered precedence
//!
//! # Example
//!
//! ```
//! use belay::builder::ContextBuilder;
//! use belay::env::DeducePolicy;
//!
//! let container = ContextBuilder::new()
//!     .environments(["test"])
//!     .deduce_environment(DeducePolicy::ForceOff)
//!     .property("server.port", 8080)
//!     .banner(false)
//!     .singleton(42u32)
//!     .start()
//!     .unwrap();
//!
//! assert!(container.is_running());
//! assert!(container.snapshot().environments.contains("test"));
//! ```

pub mod builder;
pub mod container;
pub mod env;
pub mod error;
pub mod properties;

pub use builder::{ContextBuilder, ContextOptions, ContextSnapshot};
pub use container::{
    BeanInstance, BeanLoader, Container, ContainerFactory, LifeCycle, RuntimeBeanDefinition,
    StereotypeTag, TypeKey,
};
pub use env::{CloudProbe, DeducePolicy};
pub use error::{BelayError, Result};
pub use properties::{MapPropertySource, PropertySource};
