//! # Weave Core Configuration
//!
//! Component configuration documents. Every component starts from its own
//! defaults and receives caller overrides through a deep merge: nested
//! mappings merge key by key, arrays and scalars are replaced wholesale, and
//! the override wins on conflict.
//!
//! The orchestrator never interprets values. [`ConfigData`] only merges,
//! looks up and (de)serializes them; see [`ConfigFormat`] for the supported
//! on-disk formats.
pub mod data;
pub mod error;

pub use data::{merge_values, ConfigData, ConfigFormat};
pub use error::ConfigError;
