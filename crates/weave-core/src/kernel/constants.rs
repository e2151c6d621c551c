use std::time::Duration;

/// Application name
pub const APP_NAME: &str = "Weave";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the application root path
pub const ROOT_PATH_ENV_VAR: &str = "WEAVE_ROOT";

/// Environment variable holding the deployment environment label
pub const ENVIRONMENT_ENV_VAR: &str = "WEAVE_ENV";

/// Environment label used when none is configured
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Watchdog applied to each component's `run` unless reconfigured
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(60);
