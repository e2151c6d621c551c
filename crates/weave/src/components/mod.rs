//! Built-in components shipped with the `weave` binary.
mod environment;
mod heartbeat;
mod logging;

pub use environment::EnvironmentCheckComponent;
pub use heartbeat::HeartbeatComponent;
pub use logging::LoggingComponent;

use weave_core::Application;

/// Started when no manifest is given, in no particular order; their declared
/// requirements decide the startup order.
pub const DEFAULT_COMPONENTS: &[&str] = &["heartbeat", "environment-check", "logging"];

pub fn register_builtins(app: &mut Application) {
    app.register_builtin("logging", || Box::new(LoggingComponent));
    app.register_builtin("environment-check", || Box::new(EnvironmentCheckComponent));
    app.register_builtin("heartbeat", || Box::new(HeartbeatComponent::default()));
}
