//! Network-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetworkError {
    #[error("fetch of {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported URL scheme '{scheme}' in {url}")]
    UnsupportedScheme { scheme: String, url: String },

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("fetch of {url} cancelled")]
    Cancelled { url: String },
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } => Some("Raise network.timeout or pass a larger --timeout."),
            Self::ConnectionRefused(_) | Self::DownloadFailed(_) => {
                Some("Check your network connection and that the archive host is reachable.")
            }
            Self::InvalidUrl(_) | Self::UnsupportedScheme { .. } => {
                Some("Only http and https archive URLs are supported; check dist.url in the lockfile.")
            }
            Self::HttpError { status, .. } if *status == 404 => {
                Some("The archive no longer exists at that URL; refresh the lockfile.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused(_) | Self::DownloadFailed(_) => true,
            Self::HttpError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Timeout { .. } => "network.timeout",
            Self::DownloadFailed(_) => "network.download_failed",
            Self::ConnectionRefused(_) => "network.connection_refused",
            Self::InvalidUrl(_) => "network.invalid_url",
            Self::UnsupportedScheme { .. } => "network.unsupported_scheme",
            Self::HttpError { .. } => "network.http_error",
            Self::ClientBuild(_) => "network.client_build",
            Self::Cancelled { .. } => "network.cancelled",
        };
        Some(code)
    }
}
