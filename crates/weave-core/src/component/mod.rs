//! # Weave Core Components
//!
//! The unit of composition and everything the orchestrator keeps about it.
//!
//! - [`Component`]: the trait implemented by every composable unit. It
//!   declares a name, default configuration, required configuration keys,
//!   dependency names and external packages, and provides the `init`, `run`
//!   and `stop` hooks.
//! - [`ManagedComponent`]: the registry-owned record wrapping an
//!   implementation with its merged configuration, [`ComponentState`] and
//!   [`Attachments`] table.
//! - [`ComponentContext`]: what a hook sees while it runs.
//! - [`Attachment`] / [`Attachable`]: injection of named methods from one
//!   component into another without a static dependency between them.
//! - [`Completion`]: exactly-once readiness signalling for components that
//!   report readiness from a background task.
pub mod attachment;
pub mod completion;
pub mod context;
pub mod error;
pub mod managed;
pub mod state;
pub mod traits;

pub use attachment::{Attachable, AttachTargets, AttachedFn, Attachment, Attachments};
pub use completion::{Completion, CompletionWaiter};
pub use context::ComponentContext;
pub use error::ComponentError;
pub use managed::ManagedComponent;
pub use state::ComponentState;
pub use traits::{component_name_from_type, Component};
