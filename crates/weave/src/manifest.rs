//! Component manifests: which built-ins to start, under which names, with
//! which configuration.
//!
//! ```yaml
//! components:
//!   - builtin: logging
//!     config: { level: debug }
//!   - builtin: heartbeat
//!     name: heartbeat
//!     config: { interval_ms: 250 }
//! ```
use std::path::Path;

use serde::Deserialize;

use weave_core::config::ConfigError;
use weave_core::kernel::error::Result;
use weave_core::{Application, ConfigData};

#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub components: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
    /// Catalog name of the built-in to instantiate.
    pub builtin: String,
    /// Registry name, when different from the built-in's own.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: ConfigData,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let document = ConfigData::load(path)?;
        let manifest = serde_json::from_value(document.to_value()).map_err(|e| ConfigError::DeserializationError {
            format: "manifest".to_string(),
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(manifest)
    }

    /// Add every entry to `app`, in manifest order.
    pub fn apply(self, app: &mut Application) -> Result<()> {
        for entry in self.components {
            match entry.name {
                Some(name) => app.add_component_as(&name, entry.builtin, entry.config)?,
                None => app.add_component(entry.builtin, entry.config)?,
            };
        }
        Ok(())
    }
}
