//! Lockfile loading errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LockfileError {
    #[error("no valid composer.lock file found at {path}")]
    NotFound { path: String },

    #[error("failed to read {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    ParseError { path: String, message: String },
}

impl UserFacingError for LockfileError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some(
                "Point --file at a project directory or composer.lock, or pass --force to accept another file.",
            ),
            Self::ReadFailed { .. } => Some("Ensure the lockfile is readable."),
            Self::ParseError { .. } => Some("The lockfile is not valid JSON; regenerate it."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "lockfile.not_found",
            Self::ReadFailed { .. } => "lockfile.read_failed",
            Self::ParseError { .. } => "lockfile.parse_error",
        };
        Some(code)
    }
}
