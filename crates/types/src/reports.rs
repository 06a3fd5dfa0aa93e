//! Report type definitions for operations

use pinstall_errors::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Installation report
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstallReport {
    /// Packages that were installed into the target
    pub installed: Vec<InstalledPackage>,
    /// Packages whose install task failed
    pub failed: Vec<PackageFailure>,
    /// Published target directory
    pub target: PathBuf,
    /// Path of the written installed manifest
    pub manifest: PathBuf,
    /// Total execution time
    pub duration_ms: u64,
}

impl InstallReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A package that landed in the target
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    /// Final location, `<target>/<namespace>/<leaf>`
    pub path: PathBuf,
}

/// A package whose install task failed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackageFailure {
    pub name: String,
    pub version: String,
    pub error: Error,
}
