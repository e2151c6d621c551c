use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::component::attachment::{Attachable, Attachment, Attachments};
use crate::component::context::ComponentContext;
use crate::component::error::ComponentError;
use crate::component::state::ComponentState;
use crate::component::traits::Component;
use crate::config::ConfigData;
use crate::kernel::error::Result;
use crate::utils::{lock, read, write};

/// A component as held by the registry: the implementation plus the
/// orchestrator-owned configuration, lifecycle state and attachment table.
pub struct ManagedComponent {
    name: String,
    component: Arc<dyn Component>,
    requirements: Vec<String>,
    packages: BTreeSet<String>,
    required_config: Vec<String>,
    config: RwLock<ConfigData>,
    state: Mutex<ComponentState>,
    /// Set while the `init` hook runs; the state lock is not held meanwhile.
    initializing: AtomicBool,
    attachments: Attachments,
}

impl ManagedComponent {
    /// Wrap `component` under `name`, capturing its static declarations.
    pub(crate) fn new(name: String, component: Arc<dyn Component>) -> Self {
        let mut requirements: Vec<String> = Vec::new();
        for requirement in component.requirements() {
            if !requirements.contains(&requirement) {
                requirements.push(requirement);
            }
        }
        let packages = component.packages().into_iter().collect();
        let required_config = component.required_config();
        let config = component.default_config();
        let attachments = Attachments::new(&name);

        Self {
            name,
            component,
            requirements,
            packages,
            required_config,
            config: RwLock::new(config),
            state: Mutex::new(ComponentState::Created),
            initializing: AtomicBool::new(false),
            attachments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dependency names, in declaration order without duplicates.
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    pub fn packages(&self) -> &BTreeSet<String> {
        &self.packages
    }

    pub fn state(&self) -> ComponentState {
        *lock(&self.state)
    }

    /// Snapshot of the merged configuration.
    pub fn config(&self) -> ConfigData {
        read(&self.config).clone()
    }

    /// Deep-merge `overrides` into the configuration document.
    ///
    /// Fails without changing anything if a required key would be absent
    /// afterwards, or once the component has been initialized.
    pub fn extend_config(&self, overrides: &ConfigData) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.accepts_config() {
            return Err(ComponentError::ConfigurationLocked {
                component: self.name.clone(),
                state: *state,
            }
            .into());
        }

        let mut config = write(&self.config);
        let merged = ConfigData::merged(&config, overrides);
        let missing = merged.missing_keys(self.required_config.iter().map(String::as_str));
        if let Some(key) = missing.into_iter().next() {
            return Err(ComponentError::MissingConfiguration {
                component: self.name.clone(),
                key,
            }
            .into());
        }

        *config = merged;
        *state = ComponentState::Configured;
        log::debug!("Configured component '{}'", self.name);
        Ok(())
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    pub fn attachment(&self, method: &str) -> Option<Attachment> {
        self.attachments.get(method)
    }

    pub fn component(&self) -> &Arc<dyn Component> {
        &self.component
    }

    /// The implementation as its concrete type, if it is a `T`.
    pub fn downcast<T: Component>(&self) -> Option<Arc<T>> {
        let any: Arc<dyn Any + Send + Sync> = self.component.clone();
        any.downcast::<T>().ok()
    }

    /// Move to `next`, returning the previous state.
    pub(crate) fn transition(&self, next: ComponentState) -> Result<ComponentState> {
        let mut state = lock(&self.state);
        self.transition_locked(&mut state, next)
    }

    fn transition_locked(&self, state: &mut ComponentState, next: ComponentState) -> Result<ComponentState> {
        let previous = *state;
        if !previous.can_transition_to(next) {
            return Err(ComponentError::InvalidTransition {
                component: self.name.clone(),
                from: previous,
                to: next,
            }
            .into());
        }
        *state = next;
        log::trace!("Component '{}': {} -> {}", self.name, previous, next);
        Ok(previous)
    }

    pub(crate) fn mark_failed(&self) {
        *lock(&self.state) = ComponentState::Failed;
    }

    /// Run the `init` hook unless it already ran. Returns whether it ran.
    ///
    /// The hook runs without the state lock, so it may inspect its own
    /// record through the registry.
    pub(crate) fn init(&self, ctx: &ComponentContext) -> Result<bool> {
        {
            let state = lock(&self.state);
            if state.is_initialized() {
                log::debug!("Component '{}' already initialized, skipping init", self.name);
                return Ok(false);
            }
            if !state.can_transition_to(ComponentState::Initialized) {
                return Err(ComponentError::InvalidTransition {
                    component: self.name.clone(),
                    from: *state,
                    to: ComponentState::Initialized,
                }
                .into());
            }
            if self.initializing.swap(true, Ordering::SeqCst) {
                return Err(ComponentError::InitInProgress {
                    component: self.name.clone(),
                }
                .into());
            }
        }

        log::info!("Initializing component: {}", self.name);
        let outcome = self.component.init(ctx);

        let mut state = lock(&self.state);
        self.initializing.store(false, Ordering::SeqCst);
        match outcome {
            Ok(()) => {
                self.transition_locked(&mut state, ComponentState::Initialized)?;
                Ok(true)
            }
            Err(e) => {
                *state = ComponentState::Failed;
                Err(e)
            }
        }
    }

    /// Run the readiness hook, bounded by `timeout` when given. A component
    /// that is already running is left alone.
    pub(crate) async fn run(&self, ctx: &ComponentContext, timeout: Option<Duration>) -> Result<()> {
        let state = self.state();
        if state == ComponentState::Running {
            log::debug!("Component '{}' is already running", self.name);
            return Ok(());
        }
        if state != ComponentState::Initialized {
            return Err(ComponentError::InvalidTransition {
                component: self.name.clone(),
                from: state,
                to: ComponentState::Running,
            }
            .into());
        }

        log::info!("Starting component: {}", self.name);
        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, self.component.run(ctx)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ComponentError::RunTimedOut {
                    component: self.name.clone(),
                    timeout: limit,
                }
                .into()),
            },
            None => self.component.run(ctx).await,
        };

        match outcome {
            Ok(()) => {
                self.transition(ComponentState::Running)?;
                log::info!("Component running: {}", self.name);
                Ok(())
            }
            Err(e) => {
                log::error!("Component '{}' failed to start: {}", self.name, e);
                self.mark_failed();
                Err(e)
            }
        }
    }

    /// Run the `stop` hook and record the outcome.
    pub(crate) async fn stop(&self, ctx: &ComponentContext) -> Result<()> {
        log::info!("Stopping component: {}", self.name);
        match self.component.stop(ctx).await {
            Ok(()) => {
                let mut state = lock(&self.state);
                if state.can_transition_to(ComponentState::Stopped) {
                    *state = ComponentState::Stopped;
                }
                Ok(())
            }
            Err(e) => {
                log::error!("Error stopping component {}: {}", self.name, e);
                self.mark_failed();
                Err(e)
            }
        }
    }
}

impl Attachable for ManagedComponent {
    fn attach(&self, method: &str, attachment: Attachment) {
        log::debug!("Attaching method '{}' to '{}'", method, self.name);
        self.attachments.insert(method, attachment);
    }
}

impl fmt::Debug for ManagedComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedComponent")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("requirements", &self.requirements)
            .field("packages", &self.packages)
            .field("attachments", &self.attachments.methods())
            .finish_non_exhaustive()
    }
}
