//! # Weave Core Kernel Errors
//!
//! Defines the top-level error type of the runtime.
//!
//! Subsystem errors ([`ComponentError`], [`RegistryError`], [`ConfigError`],
//! [`ProvisionError`]) fold into [`Error`] through `#[from]`, so `?` works
//! across module boundaries. Misuse of the application lifecycle (setting the
//! root path after `init`, looking up components before startup, running
//! twice) is reported as [`Error::KernelLifecycleError`] tagged with the
//! [`KernelLifecyclePhase`] it happened in.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::component::error::ComponentError;
use crate::config::error::ConfigError;
use crate::provision::error::ProvisionError;
use crate::registry::error::RegistryError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Component contract or state machine error
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    /// Registration, graph, startup or lookup error
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Configuration document error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Package provisioning error
    #[error("Provisioning error: {0}")]
    Provision(#[from] ProvisionError),

    /// I/O error raised by a component hook
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error occurring during a specific application lifecycle phase.
    #[error("Kernel lifecycle error during {phase}: {message}")]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        component_name: Option<String>,
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Represents a specific phase in the application's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum KernelLifecyclePhase {
    #[error("Configure")]
    Configure,
    #[error("Initialize")]
    Initialize,
    #[error("Provision")]
    Provision,
    #[error("RunPreCheck")]
    RunPreCheck,
    #[error("Lookup")]
    Lookup,
    #[error("Shutdown")]
    Shutdown,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    /// Lifecycle error without an underlying cause.
    pub fn lifecycle(phase: KernelLifecyclePhase, message: impl Into<String>) -> Self {
        Error::KernelLifecycleError {
            phase,
            component_name: None,
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error is a dependency-cycle graph error.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Error::Registry(RegistryError::CyclicDependency { .. }))
    }

    /// Whether this error is a missing-dependency graph error.
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Error::Registry(RegistryError::MissingDependency { .. }))
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
