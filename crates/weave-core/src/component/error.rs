//! # Weave Core Component Errors
//!
//! Errors raised by the component state machine, configuration checks, the
//! attachment table and readiness signalling.
use std::time::Duration;

use thiserror::Error;

use crate::component::state::ComponentState;

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("Component '{component}' cannot move from {from} to {to}")]
    InvalidTransition {
        component: String,
        from: ComponentState,
        to: ComponentState,
    },

    #[error("Component '{component}' requires configuration key '{key}'")]
    MissingConfiguration { component: String, key: String },

    #[error("Configuration of component '{component}' is locked once it is {state}")]
    ConfigurationLocked {
        component: String,
        state: ComponentState,
    },

    #[error("Component '{component}' is already being initialized")]
    InitInProgress { component: String },

    #[error("Component '{component}' has no attached method '{method}'")]
    AttachmentNotFound { component: String, method: String },

    #[error("Component '{component}' dropped its readiness signal without completing")]
    CompletionDropped { component: String },

    #[error("Component '{component}' did not become ready within {timeout:?}")]
    RunTimedOut { component: String, timeout: Duration },

    #[error("Component '{component}' failed: {message}")]
    Failed { component: String, message: String },
}

impl ComponentError {
    /// Convenience constructor for component implementations.
    pub fn failed(component: impl Into<String>, message: impl Into<String>) -> Self {
        ComponentError::Failed {
            component: component.into(),
            message: message.into(),
        }
    }
}
