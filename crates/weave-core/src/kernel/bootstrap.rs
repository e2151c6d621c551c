use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::component::{Component, ManagedComponent};
use crate::config::ConfigData;
use crate::kernel::catalog::{ComponentCatalog, ComponentSource};
use crate::kernel::constants;
use crate::kernel::context::AppContext;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::provision::{NoopProvisioner, Provisioner};
use crate::registry::{Registry, RegistryError};

/// Process entry point: owns the [`AppContext`], one [`Registry`] and the
/// catalog of built-in components.
pub struct Application {
    context: Arc<AppContext>,
    registry: Registry,
    catalog: ComponentCatalog,
    provisioner: Arc<dyn Provisioner>,
    initialized: bool,
    running: bool,
}

impl Application {
    /// Create an application configured from the process environment.
    pub fn new() -> Self {
        Self::with_context(AppContext::from_env())
    }

    pub fn with_context(context: AppContext) -> Self {
        let context = Arc::new(context);
        Self {
            registry: Registry::new(context.clone()),
            context,
            catalog: ComponentCatalog::new(),
            provisioner: Arc::new(NoopProvisioner),
            initialized: false,
            running: false,
        }
    }

    pub fn with_provisioner(mut self, provisioner: impl Provisioner + 'static) -> Self {
        self.provisioner = Arc::new(provisioner);
        self
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    pub fn root_path(&self) -> &Path {
        self.context.root_path()
    }

    /// Set the root path components resolve relative files against.
    pub fn path(&mut self, root_path: impl Into<PathBuf>) -> Result<&mut Self> {
        let context = (*self.context).clone().with_root_path(root_path);
        self.replace_context(context, "set the root path")?;
        Ok(self)
    }

    pub fn environment(&self) -> &str {
        self.context.environment()
    }

    pub fn set_environment(&mut self, environment: impl Into<String>) -> Result<&mut Self> {
        let context = (*self.context).clone().with_environment(environment);
        self.replace_context(context, "set the environment")?;
        Ok(self)
    }

    fn replace_context(&mut self, context: AppContext, operation: &str) -> Result<()> {
        if self.initialized {
            return Err(Error::lifecycle(
                KernelLifecyclePhase::Configure,
                format!("cannot {} after init", operation),
            ));
        }
        let context = Arc::new(context);
        self.registry.set_context(context.clone())?;
        self.context = context;
        Ok(())
    }

    pub fn set_run_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.registry.set_run_timeout(timeout);
        self
    }

    /// Make a built-in available to [`add_component`](Self::add_component)
    /// by name.
    pub fn register_builtin<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Component> + Send + Sync + 'static,
    {
        self.catalog.register(name, factory);
        self
    }

    pub fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Instantiate (for built-ins), configure and register a component.
    pub fn add_component(
        &mut self,
        source: impl Into<ComponentSource>,
        overrides: ConfigData,
    ) -> Result<Arc<ManagedComponent>> {
        let component = self.instantiate(source.into())?;
        self.registry.register(component, &overrides)
    }

    /// Like [`add_component`](Self::add_component) with an explicit name.
    pub fn add_component_as(
        &mut self,
        name: &str,
        source: impl Into<ComponentSource>,
        overrides: ConfigData,
    ) -> Result<Arc<ManagedComponent>> {
        let component = self.instantiate(source.into())?;
        self.registry.register_as(name, component, &overrides)
    }

    fn instantiate(&self, source: ComponentSource) -> Result<Box<dyn Component>> {
        match source {
            ComponentSource::Instance(component) => Ok(component),
            ComponentSource::Builtin(name) => self.catalog.create(&name),
        }
    }

    /// Merge more configuration into a registered component before startup.
    pub fn configure_component(&self, name: &str, overrides: &ConfigData) -> Result<()> {
        self.registry.get(name)?.extend_config(overrides)
    }

    /// A live component, once [`run`](Self::run) has succeeded.
    pub fn component(&self, name: &str) -> Result<Arc<ManagedComponent>> {
        if !self.running {
            return Err(Error::KernelLifecycleError {
                phase: KernelLifecyclePhase::Lookup,
                component_name: Some(name.to_string()),
                message: "components are only available after a successful run".to_string(),
                source: None,
            });
        }
        self.registry.get(name)
    }

    /// A live component as its concrete type.
    pub fn component_as<T: Component>(&self, name: &str) -> Result<Arc<T>> {
        let managed = self.component(name)?;
        managed.downcast::<T>().ok_or_else(|| {
            Error::KernelLifecycleError {
                phase: KernelLifecyclePhase::Lookup,
                component_name: Some(name.to_string()),
                message: format!("component is not a {}", std::any::type_name::<T>()),
                source: None,
            }
        })
    }

    /// Freeze the process configuration. Called by `run` if needed.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);
        log::info!("Root path: {}", self.context.root_path().display());
        log::info!("Environment: {}", self.context.environment());
        self.initialized = true;
        Ok(())
    }

    /// Provision declared packages and start every component in dependency
    /// order. Returns the aggregate startup result.
    pub async fn run(&mut self) -> Result<()> {
        if self.running || self.registry.is_frozen() {
            return Err(Error::lifecycle(
                KernelLifecyclePhase::RunPreCheck,
                "application has already been run",
            ));
        }
        self.init()?;

        let packages = self.registry.packages();
        log::debug!("Provisioning {} package(s) with '{}'", packages.len(), self.provisioner.name());
        self.provisioner
            .provision(&packages, &self.context)
            .await
            .map_err(|e| Error::KernelLifecycleError {
                phase: KernelLifecyclePhase::Provision,
                component_name: None,
                message: "package provisioning failed".to_string(),
                source: Some(Box::new(e)),
            })?;

        self.registry.initialize().await?;
        self.running = true;
        log::info!("Application started with {} components.", self.registry.len());
        Ok(())
    }

    /// Stop every running component in reverse start order.
    pub async fn shutdown(&mut self) -> Result<()> {
        let result = self.registry.shutdown().await;
        self.running = false;
        result.map_err(|e| Error::KernelLifecycleError {
            phase: KernelLifecyclePhase::Shutdown,
            component_name: None,
            message: "a component failed to stop".to_string(),
            source: Some(Box::new(e)),
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Startup failure attributed to a component, if `error` is one.
    pub fn failed_component(error: &Error) -> Option<&str> {
        match error {
            Error::Registry(registry_error @ RegistryError::StartupFailed { .. }) => registry_error.failed_component(),
            _ => None,
        }
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}
