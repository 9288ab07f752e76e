//! Error types for Belay operations.
//!
//! This module defines [`BelayError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `BelayError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `BelayError::Other`) for collaborator errors
//!   that the builder merely propagates
//! - The builder itself validates almost nothing: malformed configuration is
//!   detected by the container collaborator at build time or later

use thiserror::Error;

/// Core error type for Belay operations.
#[derive(Debug, Error)]
pub enum BelayError {
    /// A caller-supplied argument failed synchronous validation.
    ///
    /// This is the only validation the builder performs directly.
    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    /// No bean of the requested type is registered in the container.
    #[error("No bean of type '{type_name}' is registered")]
    NoSuchBean { type_name: String },

    /// A bean provider failed, or produced no instance when empty
    /// providers are not allowed.
    #[error("Failed to create bean '{type_name}': {message}")]
    BeanCreation { type_name: String, message: String },

    /// A lifecycle transition on a bean or container failed.
    #[error("Lifecycle failure for '{name}': {message}")]
    Lifecycle { name: String, message: String },

    /// Generic wrapped error for collaborator interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Belay operations.
pub type Result<T> = std::result::Result<T, BelayError>;
