use async_trait::async_trait;
use serde_json::{json, Value};

use weave_core::component::{Attachment, Component, ComponentContext, ComponentError};
use weave_core::kernel::error::Result;
use weave_core::ConfigData;

/// Pre-flight check of the host environment.
///
/// Verifies the root path is a directory and that every `required_paths`
/// entry exists relative to it. Exposes an `environment` method on
/// `heartbeat` describing where the application runs.
#[derive(Debug, Default)]
pub struct EnvironmentCheckComponent;

#[async_trait]
impl Component for EnvironmentCheckComponent {
    fn name(&self) -> String {
        "environment-check".to_string()
    }

    fn default_config(&self) -> ConfigData {
        ConfigData::from_value(json!({ "required_paths": [] })).unwrap_or_default()
    }

    fn requirements(&self) -> Vec<String> {
        vec!["logging".to_string()]
    }

    fn init(&self, ctx: &ComponentContext) -> Result<()> {
        let root = ctx.root_path().display().to_string();
        let environment = ctx.environment().to_string();
        ctx.attach_to(
            "heartbeat",
            "environment",
            Attachment::new(move |_: Value| Ok(json!({ "root": root, "environment": environment }))),
        );
        Ok(())
    }

    async fn run(&self, ctx: &ComponentContext) -> Result<()> {
        let root = ctx.root_path();
        let is_dir = tokio::fs::metadata(root).await.map(|m| m.is_dir()).unwrap_or(false);
        if !is_dir {
            return Err(ComponentError::failed(
                ctx.name(),
                format!("root path '{}' is not a directory", root.display()),
            )
            .into());
        }

        let required: Vec<String> = ctx.config().get_or("required_paths", Vec::new());
        let mut missing = Vec::new();
        for relative in &required {
            if tokio::fs::metadata(ctx.resolve(relative)).await.is_err() {
                missing.push(relative.as_str());
            }
        }
        if !missing.is_empty() {
            return Err(ComponentError::failed(
                ctx.name(),
                format!("missing required paths under '{}': {}", root.display(), missing.join(", ")),
            )
            .into());
        }

        log::info!(
            "Environment '{}' at {} passed checks ({} required paths)",
            ctx.environment(),
            root.display(),
            required.len()
        );
        Ok(())
    }
}
