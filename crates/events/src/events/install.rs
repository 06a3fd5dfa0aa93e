use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::FailureContext;

/// Installation domain events - maps to the install crate and `pinstall install`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallEvent {
    /// Scratch workspace created, per-package tasks about to launch
    BatchStarted {
        target: PathBuf,
        scratch: PathBuf,
        package_count: usize,
    },

    /// A package task began fetching
    PackageStarted { package: String, version: String },

    /// A package was relocated into the scratch workspace
    PackageCompleted {
        package: String,
        version: String,
        path: PathBuf,
        duration: Duration,
    },

    /// A package task failed in the given phase
    PackageFailed {
        package: String,
        version: String,
        phase: InstallPhase,
        failure: FailureContext,
    },

    /// Scratch workspace swapped in as the target
    Published { target: PathBuf, package_count: usize },

    /// Installed manifest written
    ManifestWritten { path: PathBuf, entries: usize },

    /// Whole run finished
    BatchCompleted {
        target: PathBuf,
        installed: usize,
        failed: usize,
        duration: Duration,
    },
}

/// Step of the per-package pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPhase {
    Fetch,
    Inspect,
    Extract,
    Relocate,
    Cleanup,
}

impl std::fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Inspect => "inspect",
            Self::Extract => "extract",
            Self::Relocate => "relocate",
            Self::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}
