//! # Weave Core Registry
//!
//! The [`Registry`] holds the registered components and drives their
//! startup:
//!
//! 1. the "requires" relations form a [`DependencyGraph`];
//! 2. missing dependencies and cycles are rejected before anything runs;
//! 3. components start as soon as everything they require is running, with
//!    independent branches running concurrently;
//! 4. the first failure stops further starts and is reported with the
//!    failing component's name.
//!
//! The registry also brokers attachments: an attach request for a component
//! that does not exist yet is queued and applied when it is registered.
pub mod component_registry;
pub mod error;
pub mod graph;
mod scheduler;

pub use component_registry::{PendingAttachment, Registry};
pub use error::RegistryError;
pub use graph::DependencyGraph;
