//! Property sources and precedence resolution.
//!
//! - The source abstraction and environment-variable filtering in [`source`]
//! - The layered precedence stack in [`resolver`]

pub mod resolver;
pub mod source;

pub use resolver::{PropertyLayer, PropertyResolver};
pub use source::{
    load_system_env, normalize_env_key, EnvironmentPropertySource, MapPropertySource,
    PropertySource,
};
