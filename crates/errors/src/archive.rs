//! Archive inspection and extraction errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArchiveError {
    #[error("unrecognized archive format: {path}")]
    UnrecognizedFormat { path: String },

    #[error("corrupt archive {path}: {message}")]
    Corrupt { path: String, message: String },

    #[error("archive has no entries: {path}")]
    Empty { path: String },

    #[error("failed to extract {path}: {message}")]
    ExtractionFailed { path: String, message: String },
}

impl UserFacingError for ArchiveError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnrecognizedFormat { .. } => {
                Some("Only zip, tar and tar.gz archives are supported.")
            }
            Self::Corrupt { .. } | Self::Empty { .. } => {
                Some("The downloaded archive is unusable; check dist.url in the lockfile.")
            }
            Self::ExtractionFailed { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::UnrecognizedFormat { .. } => "archive.unrecognized_format",
            Self::Corrupt { .. } => "archive.corrupt",
            Self::Empty { .. } => "archive.empty",
            Self::ExtractionFailed { .. } => "archive.extraction_failed",
        };
        Some(code)
    }
}
