use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use weave_core::component::{Completion, Component, ComponentContext, ComponentError};
use weave_core::kernel::error::Result;
use weave_core::utils::lock;
use weave_core::ConfigData;

/// Periodic liveness log line. Ready once the first beat has fired.
#[derive(Debug, Default)]
pub struct HeartbeatComponent {
    beats: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HeartbeatComponent {
    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Component for HeartbeatComponent {
    fn name(&self) -> String {
        "heartbeat".to_string()
    }

    fn default_config(&self) -> ConfigData {
        ConfigData::from_value(json!({ "interval_ms": 1000 })).unwrap_or_default()
    }

    fn requirements(&self) -> Vec<String> {
        vec!["environment-check".to_string()]
    }

    async fn run(&self, ctx: &ComponentContext) -> Result<()> {
        let interval_ms: u64 = ctx.config().get_or("interval_ms", 1000);
        if interval_ms == 0 {
            return Err(ComponentError::failed(ctx.name(), "interval_ms must be greater than zero").into());
        }

        let (completion, waiter) = Completion::new(ctx.name());
        let beats = self.beats.clone();
        let ctx = ctx.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            loop {
                ticker.tick().await;
                let count = beats.fetch_add(1, Ordering::SeqCst) + 1;
                match ctx.call("environment", Value::Null) {
                    Ok(environment) => log::debug!("Heartbeat #{} {}", count, environment),
                    Err(_) => log::debug!("Heartbeat #{}", count),
                }
                if !completion.is_completed() {
                    completion.succeed();
                }
            }
        });

        if let Some(previous) = lock(&self.task).replace(handle) {
            previous.abort();
        }
        waiter.wait().await
    }

    async fn stop(&self, _ctx: &ComponentContext) -> Result<()> {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
            log::info!("Heartbeat stopped after {} beats", self.beats());
        }
        Ok(())
    }
}
