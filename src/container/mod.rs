//! The container collaborator surface.
//!
//! - Bean identity and registration types in [`bean`]
//! - The container trait, factory seam, and default implementation in
//!   [`context`]

pub mod bean;
pub mod context;

pub use bean::{
    AnyBean, BeanInstance, BeanLoader, LifeCycle, RuntimeBeanDefinition, StereotypeTag, TypeKey,
};
pub use context::{Container, ContainerFactory, DefaultContainer, DefaultContainerFactory};
