#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Lockfile loading for pinstall
//!
//! A path given on the command line may name the lockfile itself or the
//! project directory containing it. Only `composer.lock` is accepted unless
//! the caller forces another file (typically `composer.json`).

use std::path::{Path, PathBuf};

use pinstall_errors::{Error, LockfileError};
use pinstall_types::{Package, PackageSet};
use serde::Deserialize;
use tokio::fs;

/// Canonical lockfile name
pub const LOCKFILE_NAME: &str = "composer.lock";

/// Manifest accepted in place of the lockfile when forced
pub const MANIFEST_NAME: &str = "composer.json";

#[derive(Debug, Default, Deserialize)]
struct RawLockfile {
    #[serde(default)]
    packages: Vec<Package>,
    #[serde(default, rename = "packages-dev")]
    packages_dev: Vec<Package>,
}

/// A loaded lockfile
#[derive(Debug, Clone)]
pub struct Lockfile {
    path: PathBuf,
    packages: Vec<Package>,
    packages_dev: Vec<Package>,
}

impl Lockfile {
    /// Locate and parse a lockfile
    ///
    /// # Errors
    ///
    /// Returns `LockfileError::NotFound` when no acceptable file exists at
    /// `path`, `ReadFailed` when it cannot be read and `ParseError` when it
    /// is not valid JSON.
    pub async fn load(path: impl AsRef<Path>, force: bool) -> Result<Self, Error> {
        let path = std::path::absolute(path.as_ref())?;
        let lockfile_path = resolve(&path, force).await?;
        tracing::debug!(path = %lockfile_path.display(), force, "loading lockfile");

        let contents = fs::read(&lockfile_path)
            .await
            .map_err(|e| LockfileError::ReadFailed {
                path: lockfile_path.display().to_string(),
                message: e.to_string(),
            })?;

        let raw: RawLockfile =
            serde_json::from_slice(&contents).map_err(|e| LockfileError::ParseError {
                path: lockfile_path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            path: lockfile_path,
            packages: raw.packages,
            packages_dev: raw.packages_dev,
        })
    }

    /// File name of the loaded lockfile
    #[must_use]
    pub fn filename(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(LOCKFILE_NAME)
    }

    /// Absolute path of the loaded lockfile
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Project directory, the lockfile's parent
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }

    #[must_use]
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    #[must_use]
    pub fn packages_dev(&self) -> &[Package] {
        &self.packages_dev
    }

    /// Packages selected for an install run
    #[must_use]
    pub fn package_set(&self, include_dev: bool) -> PackageSet {
        PackageSet::merge(&self.packages, &self.packages_dev, include_dev)
    }
}

async fn resolve(path: &Path, force: bool) -> Result<PathBuf, Error> {
    let not_found = || LockfileError::NotFound {
        path: path.display().to_string(),
    };
    let metadata = fs::metadata(path).await.map_err(|_| not_found())?;

    if metadata.is_file() {
        let is_lockfile = path.file_name().is_some_and(|name| name == LOCKFILE_NAME);
        return if is_lockfile || force {
            Ok(path.to_path_buf())
        } else {
            Err(not_found().into())
        };
    }

    let lockfile = path.join(LOCKFILE_NAME);
    if is_file(&lockfile).await {
        return Ok(lockfile);
    }
    if force {
        let manifest = path.join(MANIFEST_NAME);
        if is_file(&manifest).await {
            return Ok(manifest);
        }
    }
    Err(not_found().into())
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}
