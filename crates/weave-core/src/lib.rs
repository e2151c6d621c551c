//! # Weave Core
//!
//! Application composition runtime: independently developed components, each
//! with its own configuration, startup hook and declared dependencies, are
//! registered into a [`Registry`] and brought up in one coordinated,
//! dependency-ordered startup driven by an [`Application`].
pub mod component;
pub mod config;
pub mod kernel;
pub mod provision;
pub mod registry;
pub mod utils;

// Re-export key public types/traits for easier use by the binary and components
pub use component::{Attachable, Attachment, Completion, Component, ComponentContext, ComponentState, ManagedComponent};
pub use config::ConfigData;
pub use kernel::error::Error as KernelError;
pub use kernel::{AppContext, Application, ComponentSource};
pub use provision::{NoopProvisioner, PathProvisioner, Provisioner};
pub use registry::{DependencyGraph, Registry, RegistryError};
