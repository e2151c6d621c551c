use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::component::{
    Attachable, AttachTargets, Attachment, Component, ComponentContext, ComponentState, ManagedComponent,
};
use crate::config::ConfigData;
use crate::kernel::constants::DEFAULT_RUN_TIMEOUT;
use crate::kernel::context::AppContext;
use crate::kernel::error::Result;
use crate::registry::error::RegistryError;
use crate::registry::graph::DependencyGraph;
use crate::registry::scheduler::StartupScheduler;
use crate::utils::{lock, read, write};

/// An attach request waiting for its target to be registered.
#[derive(Debug, Clone)]
pub struct PendingAttachment {
    pub target: String,
    pub method: String,
    pub attachment: Attachment,
}

/// Owns the registered components, resolves their dependency graph and drives
/// startup.
///
/// `Registry` is a cheap handle; clones share the same components. Every
/// [`ComponentContext`] carries one so hooks can attach into siblings.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    components: RwLock<HashMap<String, Arc<ManagedComponent>>>,
    pending: Mutex<Vec<PendingAttachment>>,
    /// Set once `initialize` begins; the graph is immutable afterwards.
    frozen: AtomicBool,
    context: RwLock<Arc<AppContext>>,
    run_timeout: RwLock<Option<Duration>>,
    /// Names in the order they became ready, for reverse-order shutdown.
    started: Mutex<Vec<String>>,
}

impl Registry {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                components: RwLock::new(HashMap::new()),
                pending: Mutex::new(Vec::new()),
                frozen: AtomicBool::new(false),
                context: RwLock::new(context),
                run_timeout: RwLock::new(Some(DEFAULT_RUN_TIMEOUT)),
                started: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn context(&self) -> Arc<AppContext> {
        read(&self.inner.context).clone()
    }

    /// Replace the application context handed to components.
    pub fn set_context(&self, context: Arc<AppContext>) -> Result<()> {
        if self.is_frozen() {
            return Err(RegistryError::GraphFrozen {
                operation: "change the application context".to_string(),
            }
            .into());
        }
        *write(&self.inner.context) = context;
        Ok(())
    }

    /// Watchdog applied to each `run`; `None` waits indefinitely.
    pub fn run_timeout(&self) -> Option<Duration> {
        *read(&self.inner.run_timeout)
    }

    pub fn set_run_timeout(&self, timeout: Option<Duration>) {
        *write(&self.inner.run_timeout) = timeout;
    }

    /// Whether `initialize` has begun.
    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.load(Ordering::SeqCst)
    }

    /// Register `component` under its own name, merging `overrides` into its
    /// default configuration.
    pub fn register(&self, component: Box<dyn Component>, overrides: &ConfigData) -> Result<Arc<ManagedComponent>> {
        let name = component.name();
        self.register_as(name, component, overrides)
    }

    /// Register `component` under an explicit name.
    pub fn register_as(
        &self,
        name: impl Into<String>,
        component: Box<dyn Component>,
        overrides: &ConfigData,
    ) -> Result<Arc<ManagedComponent>> {
        let name = name.into();
        if self.is_frozen() {
            return Err(RegistryError::RegistrationClosed { name }.into());
        }

        let managed = {
            let mut components = write(&self.inner.components);
            // `initialize` freezes before it snapshots under this lock.
            if self.is_frozen() {
                return Err(RegistryError::RegistrationClosed { name }.into());
            }
            if components.contains_key(&name) {
                return Err(RegistryError::DuplicateComponent { name }.into());
            }
            let managed = Arc::new(ManagedComponent::new(name.clone(), Arc::from(component)));
            managed.extend_config(overrides)?;
            components.insert(name.clone(), managed.clone());
            managed
        };
        log::info!("Registered component: {}", name);

        self.resolve_pending(&managed);
        Ok(managed)
    }

    fn resolve_pending(&self, managed: &ManagedComponent) {
        let mut pending = lock(&self.inner.pending);
        pending.retain(|request| {
            if request.target != managed.name() {
                return true;
            }
            log::debug!("Resolving queued attachment '{}' for '{}'", request.method, request.target);
            managed.attach(&request.method, request.attachment.clone());
            false
        });
    }

    pub fn has(&self, name: &str) -> bool {
        read(&self.inner.components).contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<Arc<ManagedComponent>> {
        read(&self.inner.components)
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::ComponentNotFound { name: name.to_string() }.into())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = read(&self.inner.components).keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        read(&self.inner.components).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attach `attachment` as `method` on every target.
    ///
    /// Targets already registered receive it immediately; the others are
    /// queued and receive it the moment they are registered.
    pub fn attach_to(&self, targets: impl Into<AttachTargets>, method: &str, attachment: Attachment) {
        let targets = targets.into();
        // Pending is locked before the lookup so a concurrent registration
        // either sees the queued request or is seen by the lookup.
        let mut pending = lock(&self.inner.pending);
        for target in targets.names() {
            match read(&self.inner.components).get(target) {
                Some(managed) => managed.attach(method, attachment.clone()),
                None => {
                    log::debug!("Queueing attachment '{}' until '{}' is registered", method, target);
                    pending.push(PendingAttachment {
                        target: target.clone(),
                        method: method.to_string(),
                        attachment: attachment.clone(),
                    });
                }
            }
        }
    }

    /// Queued attach requests as `(target, method)` pairs.
    pub fn pending_attachments(&self) -> Vec<(String, String)> {
        lock(&self.inner.pending)
            .iter()
            .map(|request| (request.target.clone(), request.method.clone()))
            .collect()
    }

    /// Verify every requirement of `name` is registered. Says nothing about
    /// whether those requirements are running.
    pub fn check_dependency(&self, name: &str) -> Result<()> {
        let managed = self.get(name)?;
        for requirement in managed.requirements() {
            if !self.has(requirement) {
                return Err(RegistryError::MissingDependency {
                    component: name.to_string(),
                    dependency: requirement.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Union of every component's declared packages.
    pub fn packages(&self) -> BTreeSet<String> {
        read(&self.inner.components)
            .values()
            .flat_map(|managed| managed.packages().iter().cloned())
            .collect()
    }

    pub fn dependency_graph(&self) -> DependencyGraph {
        let components = read(&self.inner.components);
        DependencyGraph::from_components(components.values().map(|managed| managed.as_ref()))
    }

    /// Validate the graph and return the startup layers without touching any
    /// component.
    pub fn startup_plan(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.dependency_graph().layers()?)
    }

    pub(crate) fn context_for(&self, managed: &ManagedComponent) -> ComponentContext {
        ComponentContext::new(
            managed.name(),
            managed.config(),
            self.context(),
            managed.attachments().clone(),
            self.clone(),
        )
    }

    /// Start a single component outside the full startup sequence.
    pub async fn run_component(&self, name: &str) -> Result<()> {
        self.check_dependency(name)?;
        let managed = self.get(name)?;
        if managed.state() == ComponentState::Running {
            log::debug!("Component '{}' is already running", name);
            return Ok(());
        }

        let ctx = self.context_for(&managed);
        managed.init(&ctx)?;
        managed.run(&ctx, self.run_timeout()).await?;
        lock(&self.inner.started).push(name.to_string());
        Ok(())
    }

    /// Freeze the graph, validate it and bring every component up in
    /// dependency order.
    ///
    /// Graph errors are reported before any component is touched. The first
    /// startup failure aborts the components not yet started and is returned;
    /// components that already succeeded keep running.
    pub async fn initialize(&self) -> Result<()> {
        if self.inner.frozen.swap(true, Ordering::SeqCst) {
            return Err(RegistryError::AlreadyInitialized.into());
        }

        let components: BTreeMap<String, Arc<ManagedComponent>> = read(&self.inner.components)
            .iter()
            .map(|(name, managed)| (name.clone(), managed.clone()))
            .collect();
        log::info!("Initializing {} components...", components.len());

        for (target, method) in self.pending_attachments() {
            log::warn!("Attachment '{}' targets unregistered component '{}' and will never resolve", method, target);
        }

        let graph = DependencyGraph::from_components(components.values().map(|managed| managed.as_ref()));
        if let Err(e) = graph.validate() {
            log::error!("Dependency resolution failed: {}", e);
            return Err(e.into());
        }

        let scheduler = StartupScheduler::new(self.clone(), graph, components, self.run_timeout());
        let result = scheduler.run().await;
        let completed = match result {
            Ok(completed) => completed,
            Err(e) => {
                // Components that did come up still need stopping on shutdown.
                self.record_running();
                return Err(e);
            }
        };

        log::info!("All components running: {}", completed.join(", "));
        lock(&self.inner.started).extend(completed);
        Ok(())
    }

    fn record_running(&self) {
        let mut started = lock(&self.inner.started);
        for managed in read(&self.inner.components).values() {
            if managed.state() == ComponentState::Running && !started.iter().any(|name| name == managed.name()) {
                started.push(managed.name().to_string());
            }
        }
    }

    /// Stop running components in reverse start order.
    ///
    /// Every component is given the chance to stop; the first error is
    /// returned afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        let order: Vec<String> = std::mem::take(&mut *lock(&self.inner.started));
        log::info!("Shutting down components...");

        let mut first_error = None;
        for name in order.iter().rev() {
            let Ok(managed) = self.get(name) else { continue };
            if !matches!(managed.state(), ComponentState::Running | ComponentState::Initialized) {
                continue;
            }
            let ctx = self.context_for(&managed);
            if let Err(e) = managed.stop(&ctx).await {
                first_error.get_or_insert(e);
            }
        }

        log::info!("Component shutdown complete.");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("components", &self.names())
            .field("pending_attachments", &lock(&self.inner.pending).len())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}
