use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::component::Component;
use crate::kernel::error::Result;
use crate::registry::RegistryError;

/// Constructor for a built-in component.
pub type ComponentFactory = Arc<dyn Fn() -> Box<dyn Component> + Send + Sync>;

/// Well-known components an application can add by name.
#[derive(Clone, Default)]
pub struct ComponentCatalog {
    factories: BTreeMap<String, ComponentFactory>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Component> + Send + Sync + 'static,
    {
        if self.factories.insert(name.to_string(), Arc::new(factory)).is_some() {
            log::warn!("Built-in component '{}' was redefined", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Built-in names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Instantiate the built-in registered as `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn Component>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::UnknownBuiltin { name: name.to_string() })?;
        Ok(factory())
    }
}

impl fmt::Debug for ComponentCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCatalog")
            .field("builtins", &self.names())
            .finish()
    }
}

/// What to add to an application: a ready instance, or a built-in by name.
pub enum ComponentSource {
    Instance(Box<dyn Component>),
    Builtin(String),
}

impl ComponentSource {
    pub fn instance<C: Component>(component: C) -> Self {
        ComponentSource::Instance(Box::new(component))
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        ComponentSource::Builtin(name.into())
    }
}

impl From<Box<dyn Component>> for ComponentSource {
    fn from(component: Box<dyn Component>) -> Self {
        ComponentSource::Instance(component)
    }
}

impl From<&str> for ComponentSource {
    fn from(name: &str) -> Self {
        ComponentSource::Builtin(name.to_string())
    }
}

impl From<String> for ComponentSource {
    fn from(name: String) -> Self {
        ComponentSource::Builtin(name)
    }
}

impl fmt::Debug for ComponentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentSource::Instance(component) => f.debug_tuple("Instance").field(&component.name()).finish(),
            ComponentSource::Builtin(name) => f.debug_tuple("Builtin").field(name).finish(),
        }
    }
}
