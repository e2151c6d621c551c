use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::component::attachment::{AttachTargets, Attachment, Attachments};
use crate::config::ConfigData;
use crate::kernel::context::AppContext;
use crate::kernel::error::Result;
use crate::registry::Registry;

/// Everything a lifecycle hook may touch: its own configuration snapshot, the
/// process-wide [`AppContext`], its attachment table, and the owning registry
/// for attaching into siblings.
#[derive(Clone, Debug)]
pub struct ComponentContext {
    name: String,
    config: ConfigData,
    app: Arc<AppContext>,
    attachments: Attachments,
    registry: Registry,
}

impl ComponentContext {
    pub(crate) fn new(
        name: &str,
        config: ConfigData,
        app: Arc<AppContext>,
        attachments: Attachments,
        registry: Registry,
    ) -> Self {
        Self {
            name: name.to_string(),
            config,
            app,
            attachments,
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Merged configuration as it was when this context was created.
    pub fn config(&self) -> &ConfigData {
        &self.config
    }

    pub fn app(&self) -> &Arc<AppContext> {
        &self.app
    }

    pub fn root_path(&self) -> &Path {
        self.app.root_path()
    }

    pub fn environment(&self) -> &str {
        self.app.environment()
    }

    /// Resolve a path relative to the application root.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.app.resolve(relative)
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    pub fn has_attachment(&self, method: &str) -> bool {
        self.attachments.contains(method)
    }

    /// Call a method another component attached to this one.
    pub fn call(&self, method: &str, args: Value) -> Result<Value> {
        self.attachments.call(method, args)
    }

    /// Inject `attachment` into other components, see
    /// [`Registry::attach_to`].
    pub fn attach_to(&self, targets: impl Into<AttachTargets>, method: &str, attachment: Attachment) {
        self.registry.attach_to(targets, method, attachment);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
