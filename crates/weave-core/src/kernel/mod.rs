//! # Weave Core Kernel
//!
//! The `kernel` module is the top-level driver of a Weave process.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Application**: [`Application`](bootstrap::Application) owns one
//!   registry, adds components (instances or built-ins by name), provisions
//!   their packages and runs the dependency-ordered startup.
//! - **Process context**: [`AppContext`](context::AppContext) carries the root
//!   path and environment label, built once and shared with every component.
//! - **Built-ins**: [`ComponentCatalog`](catalog::ComponentCatalog) maps names
//!   to component factories.
//! - **Core Constants**: names, environment variables and the default run
//!   watchdog live in `constants`.
//! - **Error Handling**: the crate-wide [`Error`](error::Error) and `Result`.
pub mod bootstrap;
pub mod catalog;
pub mod constants;
pub mod context;
pub mod error;

pub use bootstrap::Application;
pub use catalog::{ComponentCatalog, ComponentFactory, ComponentSource};
pub use context::AppContext;
pub use error::{Error, KernelLifecyclePhase, Result};
