use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::FailureContext;

/// Archive download events emitted by the fetcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// Response headers received, body streaming begins
    Started {
        url: String,
        package: Option<String>,
        total_size: Option<u64>,
    },

    /// Body fully written to disk
    Completed {
        url: String,
        package: Option<String>,
        final_size: u64,
        total_time: Duration,
    },

    /// Download failed; no retry follows
    Failed {
        url: String,
        package: Option<String>,
        failure: FailureContext,
        bytes_downloaded: u64,
    },
}

impl DownloadEvent {
    /// URL this event refers to
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Started { url, .. } | Self::Completed { url, .. } | Self::Failed { url, .. } => {
                url
            }
        }
    }
}
