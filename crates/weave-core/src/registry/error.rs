//! # Weave Core Registry Errors
//!
//! Errors raised by the component registry, grouped as:
//!
//! - registration: [`DuplicateComponent`](RegistryError::DuplicateComponent),
//!   [`RegistrationClosed`](RegistryError::RegistrationClosed),
//!   [`GraphFrozen`](RegistryError::GraphFrozen);
//! - graph: [`MissingDependency`](RegistryError::MissingDependency),
//!   [`CyclicDependency`](RegistryError::CyclicDependency), both detected
//!   before any component is touched;
//! - startup: [`StartupFailed`](RegistryError::StartupFailed), carrying the
//!   first failing component and its cause;
//! - lookup: [`ComponentNotFound`](RegistryError::ComponentNotFound),
//!   [`UnknownBuiltin`](RegistryError::UnknownBuiltin).
use thiserror::Error;

use crate::kernel::error::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Component '{name}' is already registered")]
    DuplicateComponent { name: String },

    #[error("Cannot register component '{name}': the registry has started initializing")]
    RegistrationClosed { name: String },

    #[error("Cannot {operation}: the registry has started initializing")]
    GraphFrozen { operation: String },

    #[error("Component '{name}' not found")]
    ComponentNotFound { name: String },

    #[error("No built-in component named '{name}'")]
    UnknownBuiltin { name: String },

    #[error("Component '{component}' requires '{dependency}', which is not registered")]
    MissingDependency { component: String, dependency: String },

    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Registry has already been initialized")]
    AlreadyInitialized,

    #[error("Startup failed in component '{component}': {source}")]
    StartupFailed {
        component: String,
        #[source]
        source: Box<Error>,
        /// Components that failed after the first failure was recorded.
        also_failed: Vec<String>,
    },

    #[error("Internal registry error: {0}")]
    InternalError(String),
}

impl RegistryError {
    /// Name of the component a startup failure is attributed to.
    pub fn failed_component(&self) -> Option<&str> {
        match self {
            RegistryError::StartupFailed { component, .. } => Some(component),
            _ => None,
        }
    }
}
