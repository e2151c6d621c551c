use std::path::{Path, PathBuf};

use crate::kernel::constants::{DEFAULT_ENVIRONMENT, ENVIRONMENT_ENV_VAR, ROOT_PATH_ENV_VAR};

/// Process-wide settings read once at startup and shared, immutable, with
/// every component through its [`ComponentContext`](crate::component::ComponentContext).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    root_path: PathBuf,
    environment: String,
}

impl AppContext {
    pub fn new(root_path: impl Into<PathBuf>, environment: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            environment: environment.into(),
        }
    }

    /// Build from `WEAVE_ROOT` and `WEAVE_ENV`, falling back to the current
    /// directory and the default environment label.
    pub fn from_env() -> Self {
        let root_path = std::env::var_os(ROOT_PATH_ENV_VAR)
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let environment = std::env::var(ENVIRONMENT_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        Self::new(root_path, environment)
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Join a relative path onto the root. Absolute paths are returned as-is.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root_path.join(relative)
    }

    pub fn with_root_path(mut self, root_path: impl Into<PathBuf>) -> Self {
        self.root_path = root_path.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(".", DEFAULT_ENVIRONMENT)
    }
}
