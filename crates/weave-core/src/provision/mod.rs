//! # Weave Core Provisioning
//!
//! Components may declare external packages they need (a compiler binary, a
//! system tool). Before startup the application hands the union of those
//! declarations to its [`Provisioner`]. Provisioning never affects the
//! startup order.
//!
//! Two provisioners ship with the core: [`NoopProvisioner`], which assumes
//! everything is present, and [`PathProvisioner`], a pre-flight check that
//! every package resolves to an executable in a set of search directories.
pub mod error;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::kernel::context::AppContext;
use crate::kernel::error::Result;

pub use error::ProvisionError;

/// External package identifiers, deduplicated and sorted.
pub type PackageSet = BTreeSet<String>;

#[async_trait]
pub trait Provisioner: Send + Sync {
    fn name(&self) -> &str;

    /// Make sure every package in `packages` is available.
    async fn provision(&self, packages: &PackageSet, app: &AppContext) -> Result<()>;
}

/// Assumes every package is already installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProvisioner;

#[async_trait]
impl Provisioner for NoopProvisioner {
    fn name(&self) -> &str {
        "noop"
    }

    async fn provision(&self, packages: &PackageSet, _app: &AppContext) -> Result<()> {
        if !packages.is_empty() {
            log::info!(
                "Assuming required packages are installed: {}",
                packages.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }
        Ok(())
    }
}

/// Checks that each package names a file in one of the search directories.
///
/// Relative search directories are resolved against the application root.
#[derive(Debug, Clone)]
pub struct PathProvisioner {
    search_paths: Vec<PathBuf>,
}

impl PathProvisioner {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Search the directories listed in `PATH`.
    pub fn from_env() -> Self {
        let search_paths = std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).collect())
            .unwrap_or_default();
        Self::new(search_paths)
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Where `package` was found, if anywhere.
    pub fn locate(&self, package: &str, app: &AppContext) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .map(|dir| resolve_dir(dir, app).join(package))
            .find(|candidate| candidate.exists())
    }
}

fn resolve_dir(dir: &Path, app: &AppContext) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        app.resolve(dir)
    }
}

#[async_trait]
impl Provisioner for PathProvisioner {
    fn name(&self) -> &str {
        "path"
    }

    async fn provision(&self, packages: &PackageSet, app: &AppContext) -> Result<()> {
        for package in packages {
            match self.locate(package, app) {
                Some(path) if path.is_file() => {
                    log::debug!("Package '{}' found at {}", package, path.display());
                }
                Some(path) => {
                    return Err(ProvisionError::NotAFile {
                        package: package.clone(),
                        path,
                    }
                    .into());
                }
                None => {
                    return Err(ProvisionError::PackageMissing {
                        package: package.clone(),
                        searched: self.search_paths.len(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
