use async_trait::async_trait;
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use weave_core::component::{Component, ComponentContext, ComponentError};
use weave_core::kernel::error::Result;
use weave_core::ConfigData;

/// Installs the process-wide log subscriber.
///
/// Configuration: `level` (an `EnvFilter` directive, default `info`) and
/// `format` (`plain` or `json`). `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Default)]
pub struct LoggingComponent;

#[async_trait]
impl Component for LoggingComponent {
    fn name(&self) -> String {
        "logging".to_string()
    }

    fn default_config(&self) -> ConfigData {
        ConfigData::from_value(json!({ "level": "info", "format": "plain" })).unwrap_or_default()
    }

    fn init(&self, ctx: &ComponentContext) -> Result<()> {
        let level: String = ctx.config().get_or("level", "info".to_string());
        let format: String = ctx.config().get_or("format", "plain".to_string());

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&level))
            .map_err(|e| ComponentError::failed(ctx.name(), format!("invalid log level '{}': {}", level, e)))?;
        let layer = match format.as_str() {
            "json" => fmt::layer().json().with_writer(std::io::stderr).boxed(),
            "plain" => fmt::layer().with_writer(std::io::stderr).boxed(),
            other => {
                return Err(ComponentError::failed(ctx.name(), format!("unknown log format '{}'", other)).into());
            }
        };
        // A subscriber may already be installed (tests, embedding hosts).
        // `try_init` also bridges `log` records into it.
        if let Err(e) = tracing_subscriber::registry().with(filter).with(layer).try_init() {
            log::warn!("Log subscriber already installed, keeping it: {}", e);
            return Ok(());
        }
        tracing::info!(%level, %format, "Logging initialized");
        Ok(())
    }

    async fn run(&self, _ctx: &ComponentContext) -> Result<()> {
        Ok(())
    }
}
