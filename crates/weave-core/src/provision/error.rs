//! # Weave Core Provisioning Errors
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Required package '{package}' was not found in {searched} search location(s)")]
    PackageMissing { package: String, searched: usize },

    #[error("Package '{package}' resolved to '{}', which is not a file", path.display())]
    NotAFile { package: String, path: PathBuf },

    #[error("Provisioning failed for '{package}': {message}")]
    Failed { package: String, message: String },
}
