#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for pinstall
//!
//! This crate handles the HTTP side of an install: a pooled client and a
//! streaming archive download that honours a deadline and a cancellation
//! token. Downloads are attempted once.

mod client;
mod download;

pub use client::{NetClient, NetConfig};
pub use download::{Download, DownloadResult};

use pinstall_errors::Error;
use pinstall_events::EventEmitter;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Download a file, reporting through `events`
///
/// # Errors
///
/// Returns an error if the URL is invalid, the download fails, the deadline
/// expires, the token is cancelled, or writing the file fails.
pub async fn download_file<E: EventEmitter>(
    client: &NetClient,
    url: &str,
    dest: &Path,
    deadline: Option<Duration>,
    cancel: &CancellationToken,
    events: &E,
) -> Result<DownloadResult, Error> {
    let download = Download::new(url)?.with_deadline(deadline);
    download.execute(client, dest, cancel, events).await
}
