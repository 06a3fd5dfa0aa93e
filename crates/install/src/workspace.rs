//! Scratch workspace and the atomic publish step
//!
//! The scratch directory lives beside the target inside the project
//! directory, so the final rename never crosses a filesystem boundary.

use std::path::{Path, PathBuf};

use pinstall_errors::{Error, InstallError};
use tokio::fs;
use uuid::Uuid;

/// Prefix shared by every scratch directory
pub const SCRATCH_PREFIX: &str = ".pinstall_";

/// Uniquely named staging directory for one install run
#[derive(Debug)]
pub struct ScratchWorkspace {
    root: PathBuf,
    target: PathBuf,
}

impl ScratchWorkspace {
    /// Create `<project>/.pinstall_<uuid>` for a run publishing into `target`
    ///
    /// # Errors
    ///
    /// Returns `InstallError::FilesystemError` if the directory cannot be created.
    pub async fn create(project_dir: &Path, target: &Path) -> Result<Self, Error> {
        let root = project_dir.join(format!("{SCRATCH_PREFIX}{}", Uuid::new_v4().simple()));
        fs::create_dir(&root)
            .await
            .map_err(|e| InstallError::filesystem("create scratch workspace", &root, &e))?;
        tracing::debug!(scratch = %root.display(), target = %target.display(), "scratch workspace created");

        Ok(Self {
            root,
            target: target.to_path_buf(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Replace the target with the scratch directory
    ///
    /// The old target is removed first; a missing target is fine. This is
    /// the only point at which the target changes.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::FilesystemError` if the old target cannot be
    /// removed or the rename fails. The scratch directory is left in place.
    pub async fn publish(self) -> Result<PathBuf, Error> {
        match fs::remove_dir_all(&self.target).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(InstallError::filesystem("remove previous target", &self.target, &e).into())
            }
        }

        fs::rename(&self.root, &self.target)
            .await
            .map_err(|e| InstallError::filesystem("publish scratch workspace", &self.target, &e))?;

        Ok(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_is_sibling_of_target() {
        let project = tempfile::tempdir().unwrap();
        let target = project.path().join("vendor");
        let workspace = ScratchWorkspace::create(project.path(), &target)
            .await
            .unwrap();

        assert_eq!(workspace.root().parent(), Some(project.path()));
        assert!(workspace
            .root()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SCRATCH_PREFIX));
        assert!(workspace.root().is_dir());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_publish_replaces_existing_target() {
        let project = tempfile::tempdir().unwrap();
        let target = project.path().join("vendor");
        std::fs::create_dir_all(target.join("stale/pkg")).unwrap();
        std::fs::write(target.join("stale/pkg/old.php"), "<?php").unwrap();

        let workspace = ScratchWorkspace::create(project.path(), &target)
            .await
            .unwrap();
        let scratch = workspace.root().to_path_buf();
        std::fs::create_dir_all(scratch.join("acme/widgets")).unwrap();

        let published = workspace.publish().await.unwrap();
        assert_eq!(published, target);
        assert!(target.join("acme/widgets").is_dir());
        assert!(!target.join("stale").exists());
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn test_publish_without_previous_target() {
        let project = tempfile::tempdir().unwrap();
        let target = project.path().join("vendor");
        let workspace = ScratchWorkspace::create(project.path(), &target)
            .await
            .unwrap();

        workspace.publish().await.unwrap();
        assert!(target.is_dir());
    }

    #[tokio::test]
    async fn test_create_fails_without_project_dir() {
        let project = tempfile::tempdir().unwrap();
        let missing = project.path().join("missing");
        let err = ScratchWorkspace::create(&missing, &missing.join("vendor"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Install(InstallError::FilesystemError { .. })
        ));
    }
}
