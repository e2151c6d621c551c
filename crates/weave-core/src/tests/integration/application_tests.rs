#![cfg(test)]

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::component::{Attachment, Component, ComponentContext, ComponentState};
use crate::config::ConfigData;
use crate::kernel::bootstrap::Application;
use crate::kernel::catalog::ComponentSource;
use crate::kernel::context::AppContext;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::provision::{PackageSet, Provisioner};
use crate::tests::integration::common::{EventLog, MockComponent, RunBehavior};

fn test_app() -> Application {
    Application::with_context(AppContext::new(".", "test"))
}

/// Provisioner that records what it was asked for.
#[derive(Clone, Default)]
struct RecordingProvisioner {
    seen: Arc<StdMutex<Vec<PackageSet>>>,
    fail: bool,
}

#[async_trait]
impl Provisioner for RecordingProvisioner {
    fn name(&self) -> &str {
        "recording"
    }

    async fn provision(&self, packages: &PackageSet, _app: &AppContext) -> Result<()> {
        self.seen.lock().unwrap().push(packages.clone());
        if self.fail {
            return Err(crate::provision::ProvisionError::PackageMissing {
                package: "gcc".to_string(),
                searched: 0,
            }
            .into());
        }
        Ok(())
    }
}

/// Exposes a `greet` attachment on `greeter`, registered in `init`.
struct GreetingSource;

#[async_trait]
impl Component for GreetingSource {
    fn name(&self) -> String {
        "greeting-source".to_string()
    }

    fn init(&self, ctx: &ComponentContext) -> Result<()> {
        let prefix: String = ctx.config().get_or("prefix", "hello".to_string());
        ctx.attach_to(
            "greeter",
            "greet",
            Attachment::new(move |args: Value| {
                let who = args.as_str().unwrap_or("nobody");
                Ok(json!(format!("{}, {}", prefix, who)))
            }),
        );
        Ok(())
    }

    async fn run(&self, _ctx: &ComponentContext) -> Result<()> {
        Ok(())
    }
}

/// Calls `greet` from `run`; must start after `greeting-source`.
#[derive(Default)]
struct Greeter {
    greeting: StdMutex<Option<String>>,
}

#[async_trait]
impl Component for Greeter {
    fn requirements(&self) -> Vec<String> {
        vec!["greeting-source".to_string()]
    }

    async fn run(&self, ctx: &ComponentContext) -> Result<()> {
        let value = ctx.call("greet", json!("weave"))?;
        *self.greeting.lock().unwrap() = value.as_str().map(str::to_string);
        Ok(())
    }
}

#[tokio::test]
async fn test_attachment_made_in_init_is_callable_by_dependent() {
    let mut app = test_app();
    app.add_component(
        ComponentSource::instance(GreetingSource),
        ConfigData::new().with("prefix", "hi").unwrap(),
    )
    .unwrap();
    app.add_component(ComponentSource::instance(Greeter::default()), ConfigData::new())
        .unwrap();

    app.run().await.unwrap();

    let greeter = app.component_as::<Greeter>("greeter").unwrap();
    assert_eq!(greeter.greeting.lock().unwrap().as_deref(), Some("hi, weave"));
    assert!(app.registry().pending_attachments().is_empty());
}

#[tokio::test]
async fn test_builtins_are_added_by_name() {
    let log = EventLog::new();
    let mut app = test_app();
    let factory_log = log.clone();
    app.register_builtin("ticker", move || MockComponent::new("ticker", &factory_log).boxed());

    app.add_component("ticker", ConfigData::new()).unwrap();
    app.run().await.unwrap();

    assert!(log.contains("end:ticker"));
    assert_eq!(app.component("ticker").unwrap().state(), ComponentState::Running);
}

#[tokio::test]
async fn test_unknown_builtin_is_rejected() {
    let mut app = test_app();
    let err = app.add_component("nonexistent", ConfigData::new()).unwrap_err();
    assert!(err.to_string().contains("nonexistent"), "got: {}", err);
}

#[tokio::test]
async fn test_builtin_registered_under_another_name() {
    let log = EventLog::new();
    let mut app = test_app();
    let factory_log = log.clone();
    app.register_builtin("worker", move || MockComponent::new("worker", &factory_log).boxed());

    app.add_component_as("worker-1", "worker", ConfigData::new()).unwrap();
    app.add_component_as("worker-2", "worker", ConfigData::new()).unwrap();
    app.run().await.unwrap();

    assert_eq!(app.registry().names(), vec!["worker-1".to_string(), "worker-2".to_string()]);
}

#[tokio::test]
async fn test_provisioner_receives_union_of_packages() {
    let log = EventLog::new();
    let provisioner = RecordingProvisioner::default();
    let mut app = test_app().with_provisioner(provisioner.clone());
    app.add_component(MockComponent::new("a", &log).packages(&["gcc", "make"]).boxed(), ConfigData::new())
        .unwrap();
    app.add_component(MockComponent::new("b", &log).packages(&["make", "cmake"]).boxed(), ConfigData::new())
        .unwrap();

    app.run().await.unwrap();

    let seen = provisioner.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    let expected: PackageSet = ["cmake", "gcc", "make"].iter().map(|p| p.to_string()).collect();
    assert_eq!(seen[0], expected);
}

#[tokio::test]
async fn test_failed_provisioning_starts_nothing() {
    let log = EventLog::new();
    let provisioner = RecordingProvisioner {
        fail: true,
        ..Default::default()
    };
    let mut app = test_app().with_provisioner(provisioner);
    let component = MockComponent::new("needs-gcc", &log).packages(&["gcc"]);
    let stats = component.stats();
    app.add_component(component.boxed(), ConfigData::new()).unwrap();

    let err = app.run().await.unwrap_err();

    assert!(matches!(
        err,
        Error::KernelLifecycleError {
            phase: KernelLifecyclePhase::Provision,
            ..
        }
    ));
    assert_eq!(stats.inits(), 0);
    assert_eq!(stats.runs(), 0);
    assert!(!app.is_running());
}

#[tokio::test]
async fn test_run_twice_is_rejected() {
    let log = EventLog::new();
    let mut app = test_app();
    app.add_component(MockComponent::new("once", &log).boxed(), ConfigData::new())
        .unwrap();

    app.run().await.unwrap();
    let err = app.run().await.unwrap_err();

    assert!(matches!(
        err,
        Error::KernelLifecycleError {
            phase: KernelLifecyclePhase::RunPreCheck,
            ..
        }
    ));
}

#[tokio::test]
async fn test_failed_startup_reports_component_and_blocks_lookup() {
    let log = EventLog::new();
    let mut app = test_app();
    app.add_component(
        MockComponent::new("flaky", &log)
            .behavior(RunBehavior::Fail("refused".to_string()))
            .boxed(),
        ConfigData::new(),
    )
    .unwrap();

    let err = app.run().await.unwrap_err();

    assert_eq!(Application::failed_component(&err), Some("flaky"));
    assert!(!app.is_running());
    assert!(app.component("flaky").is_err());
}

#[tokio::test]
async fn test_configuration_reaches_the_component() {
    #[derive(Default)]
    struct Port {
        seen: StdMutex<Option<u16>>,
    }

    #[async_trait]
    impl Component for Port {
        fn default_config(&self) -> ConfigData {
            ConfigData::from_value(json!({"server": {"host": "localhost", "port": 80}})).unwrap()
        }

        async fn run(&self, ctx: &ComponentContext) -> Result<()> {
            *self.seen.lock().unwrap() = ctx.config().get("server.port");
            Ok(())
        }
    }

    let mut app = test_app();
    app.add_component(
        ComponentSource::instance(Port::default()),
        ConfigData::from_value(json!({"server": {"port": 8080}})).unwrap(),
    )
    .unwrap();
    app.configure_component("port", &ConfigData::from_value(json!({"server": {"port": 9090}})).unwrap())
        .unwrap();

    app.run().await.unwrap();

    let managed = app.component("port").unwrap();
    assert_eq!(managed.config().get::<String>("server.host").as_deref(), Some("localhost"));
    let port = app.component_as::<Port>("port").unwrap();
    assert_eq!(*port.seen.lock().unwrap(), Some(9090));
}

#[tokio::test]
async fn test_shutdown_after_run() {
    let log = EventLog::new();
    let mut app = test_app();
    app.add_component(MockComponent::new("db", &log).boxed(), ConfigData::new())
        .unwrap();
    app.add_component(MockComponent::new("api", &log).requires(&["db"]).boxed(), ConfigData::new())
        .unwrap();
    app.run().await.unwrap();

    app.shutdown().await.unwrap();

    log.assert_before("stop:api", "stop:db");
    assert!(!app.is_running());
}
