use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::error::ConfigError;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// Deep-merge `overlay` into `base`.
///
/// Mappings merge recursively; any other overlay value (arrays included)
/// replaces what was in `base`.
pub fn merge_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_values(existing, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// A component's structured key-value configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl ConfigData {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self { values: Map::new() }
    }

    /// Build a document from a JSON value. Only mappings (or `null`, read as
    /// an empty document) are accepted.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::new()),
            other => Err(ConfigError::NotAMapping {
                found: value_kind(&other).to_string(),
            }),
        }
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// The document as a JSON mapping value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Top-level keys
    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Look up a raw value by dotted path, e.g. `"server.tls.cert"`.
    pub fn get_value(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.values.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Get a configuration value by dotted path, deserialized into `T`.
    pub fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Option<T> {
        self.get_value(path)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Get a configuration value with default
    pub fn get_or<T: for<'de> Deserialize<'de>>(&self, path: &str, default: T) -> T {
        self.get(path).unwrap_or(default)
    }

    /// Whether a dotted path resolves to a non-null value.
    pub fn contains(&self, path: &str) -> bool {
        matches!(self.get_value(path), Some(value) if !value.is_null())
    }

    /// Set a top-level configuration value
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), ConfigError> {
        let json_value = serde_json::to_value(value).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.values.insert(key.to_string(), json_value);
        Ok(())
    }

    /// Builder-style [`set`](Self::set).
    pub fn with<T: Serialize>(mut self, key: &str, value: T) -> Result<Self, ConfigError> {
        self.set(key, value)?;
        Ok(self)
    }

    /// Remove a top-level configuration value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Deep-merge `overrides` into this document; the override wins on conflict.
    pub fn deep_merge(&mut self, overrides: &ConfigData) {
        for (key, overlay_value) in &overrides.values {
            match self.values.get_mut(key) {
                Some(existing) => merge_values(existing, overlay_value),
                None => {
                    self.values.insert(key.clone(), overlay_value.clone());
                }
            }
        }
    }

    /// Defaults merged with overrides, leaving both inputs untouched.
    pub fn merged(defaults: &ConfigData, overrides: &ConfigData) -> ConfigData {
        let mut result = defaults.clone();
        result.deep_merge(overrides);
        result
    }

    /// The subset of `required` paths that are absent (or null).
    pub fn missing_keys<'a, I>(&self, required: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        required
            .into_iter()
            .filter(|path| !self.contains(path))
            .map(str::to_string)
            .collect()
    }

    /// Serialize to string based on format
    pub fn serialize(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        let serialization_error = |message: String| ConfigError::SerializationError {
            format: format.extension().to_string(),
            message,
        };
        match format {
            ConfigFormat::Json => {
                serde_json::to_string_pretty(&self).map_err(|e| serialization_error(e.to_string()))
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => {
                serde_yaml::to_string(&self).map_err(|e| serialization_error(e.to_string()))
            }
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => {
                toml::to_string_pretty(&self).map_err(|e| serialization_error(e.to_string()))
            }
        }
    }

    /// Deserialize from string based on format
    pub fn deserialize(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let deserialization_error = |message: String| ConfigError::DeserializationError {
            format: format.extension().to_string(),
            message,
        };
        let value: Value = match format {
            ConfigFormat::Json => {
                serde_json::from_str(data).map_err(|e| deserialization_error(e.to_string()))?
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => {
                serde_yaml::from_str(data).map_err(|e| deserialization_error(e.to_string()))?
            }
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => {
                toml::from_str(data).map_err(|e| deserialization_error(e.to_string()))?
            }
        };
        Self::from_value(value)
    }

    /// Read a document from disk, picking the format from the file extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::deserialize(&data, format)
    }
}

impl From<Map<String, Value>> for ConfigData {
    fn from(values: Map<String, Value>) -> Self {
        Self::from_map(values)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}
