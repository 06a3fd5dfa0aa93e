//! Installation system error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstallError {
    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },

    #[error("invalid package name: {name}")]
    InvalidPackageName { name: String },

    #[error("{count} package(s) failed to install: {packages}")]
    PackagesFailed { count: usize, packages: String },

    #[error("task execution failed: {message}")]
    TaskError { message: String },

    #[error("concurrency error: {message}")]
    ConcurrencyError { message: String },

    #[error("installation cancelled by user")]
    Cancelled,
}

impl InstallError {
    /// Shorthand for a failed filesystem operation on `path`
    pub fn filesystem(
        operation: impl Into<String>,
        path: &std::path::Path,
        err: &std::io::Error,
    ) -> Self {
        Self::FilesystemError {
            operation: operation.into(),
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::FilesystemError { .. } => {
                Some("Ensure the project directory is writable and has free space.")
            }
            Self::InvalidPackageName { .. } => {
                Some("Package names must have the form namespace/name.")
            }
            Self::PackagesFailed { .. } => Some(
                "Nothing was published. Re-run, or pass --keep-going to publish the packages that succeeded.",
            ),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PackagesFailed { .. } | Self::TaskError { .. } | Self::ConcurrencyError { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::FilesystemError { .. } => "install.filesystem",
            Self::InvalidPackageName { .. } => "install.invalid_package_name",
            Self::PackagesFailed { .. } => "install.packages_failed",
            Self::TaskError { .. } => "install.task_error",
            Self::ConcurrencyError { .. } => "install.concurrency",
            Self::Cancelled => "install.cancelled",
        };
        Some(code)
    }
}
