//! Streaming archive download with deadline and cancellation

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures::StreamExt;
use pinstall_errors::{Error, NetworkError};
use pinstall_events::{AppEvent, DownloadEvent, EventEmitter, FailureContext};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::NetClient;

/// Outcome of a completed download
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub path: PathBuf,
    pub size: u64,
    pub duration: Duration,
}

/// A single validated download
#[derive(Debug, Clone)]
pub struct Download {
    url: Url,
    package: Option<String>,
    deadline: Option<Duration>,
}

impl Download {
    /// Validate `url` and prepare a download
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidUrl` for unparsable URLs and
    /// `NetworkError::UnsupportedScheme` for anything but http and https.
    pub fn new(url: &str) -> Result<Self, Error> {
        Ok(Self {
            url: validate_url(url)?,
            package: None,
            deadline: None,
        })
    }

    /// Tag events with the package this archive belongs to
    #[must_use]
    pub fn for_package(mut self, name: impl Into<String>) -> Self {
        self.package = Some(name.into());
        self
    }

    /// Bound the whole transfer, headers and body, by `deadline`
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Stream the body to `dest`
    ///
    /// On any failure the partially written file is removed.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures, non-success statuses,
    /// an expired deadline, cancellation, or I/O errors writing `dest`.
    pub async fn execute<E: EventEmitter>(
        &self,
        client: &NetClient,
        dest: &Path,
        cancel: &CancellationToken,
        events: &E,
    ) -> Result<DownloadResult, Error> {
        let start = Instant::now();
        let written = AtomicU64::new(0);

        let transfer = async {
            match self.deadline {
                Some(deadline) => {
                    let fetch = self.stream_to(client, dest, &written, events);
                    match tokio::time::timeout(deadline, fetch).await {
                        Ok(result) => result,
                        Err(_) => Err(NetworkError::Timeout {
                            url: self.url.to_string(),
                            seconds: deadline.as_secs(),
                        }
                        .into()),
                    }
                }
                None => self.stream_to(client, dest, &written, events).await,
            }
        };

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(NetworkError::Cancelled {
                url: self.url.to_string(),
            }
            .into()),
            result = transfer => result,
        };

        match outcome {
            Ok(size) => {
                let duration = start.elapsed();
                self.emit(
                    events,
                    DownloadEvent::Completed {
                        url: self.url.to_string(),
                        package: self.package.clone(),
                        final_size: size,
                        total_time: duration,
                    },
                );
                Ok(DownloadResult {
                    path: dest.to_path_buf(),
                    size,
                    duration,
                })
            }
            Err(err) => {
                if let Err(e) = fs::remove_file(dest).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(path = %dest.display(), error = %e, "failed to remove partial download");
                    }
                }
                self.emit(
                    events,
                    DownloadEvent::Failed {
                        url: self.url.to_string(),
                        package: self.package.clone(),
                        failure: FailureContext::from_error(&err),
                        bytes_downloaded: written.load(Ordering::Relaxed),
                    },
                );
                Err(err)
            }
        }
    }

    async fn stream_to<E: EventEmitter>(
        &self,
        client: &NetClient,
        dest: &Path,
        written: &AtomicU64,
        events: &E,
    ) -> Result<u64, Error> {
        let response = client.get(self.url.as_str()).await?;
        validate_response(&response)?;

        self.emit(
            events,
            DownloadEvent::Started {
                url: self.url.to_string(),
                package: self.package.clone(),
                total_size: response.content_length(),
            },
        );

        let mut file = File::create(dest)
            .await
            .map_err(|e| Error::io_with_path(&e, dest))?;
        let mut stream = response.bytes_stream();
        let mut size = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io_with_path(&e, dest))?;
            size += chunk.len() as u64;
            written.store(size, Ordering::Relaxed);
        }

        file.flush()
            .await
            .map_err(|e| Error::io_with_path(&e, dest))?;

        tracing::debug!(url = %self.url, bytes = size, "download finished");
        Ok(size)
    }

    fn emit<E: EventEmitter>(&self, events: &E, event: DownloadEvent) {
        let event = AppEvent::Download(event);
        match &self.package {
            Some(name) => events.emit_for(name.clone(), event),
            None => events.emit(event),
        }
    }
}

/// Validate URL and check for supported protocols
fn validate_url(url: &str) -> Result<Url, Error> {
    let parsed = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(NetworkError::UnsupportedScheme {
            scheme: scheme.to_string(),
            url: url.to_string(),
        }
        .into()),
    }
}

/// Reject non-success statuses
fn validate_response(response: &reqwest::Response) -> Result<(), Error> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(NetworkError::HttpError {
            status: status.as_u16(),
            message: status.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/a.zip").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/a.zip").is_ok());
        assert!(matches!(
            validate_url("not a url"),
            Err(Error::Network(NetworkError::InvalidUrl(_)))
        ));
        assert!(matches!(
            validate_url("ftp://example.com/a.zip"),
            Err(Error::Network(NetworkError::UnsupportedScheme { .. }))
        ));
    }
}
