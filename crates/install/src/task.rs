//! Per-package install task: fetch, inspect, extract, relocate

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pinstall_errors::{Error, InstallError};
use pinstall_events::{
    AppEvent, EventEmitter, FailureContext, InstallEvent, InstallPhase, ProgressCounter,
};
use pinstall_net::{Download, NetClient};
use pinstall_types::Package;
use tokio::fs;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::archive;
use crate::context::InstallContext;
use crate::limits::acquire_semaphore_permit;

pub(crate) struct PackageTaskArgs {
    pub index: usize,
    pub package: Package,
    pub scratch: PathBuf,
    pub client: NetClient,
    pub deadline: Option<Duration>,
    pub context: InstallContext,
    pub progress: ProgressCounter,
    pub semaphore: Option<Arc<Semaphore>>,
}

/// What a finished task hands back to the orchestrator
#[derive(Debug)]
pub(crate) struct TaskOutcome {
    pub index: usize,
    /// Final location inside the scratch workspace
    pub result: Result<PathBuf, Error>,
}

type PhaseResult<T> = Result<T, (InstallPhase, Error)>;

fn at<E: Into<Error>>(phase: InstallPhase) -> impl FnOnce(E) -> (InstallPhase, Error) {
    move |e| (phase, e.into())
}

/// Scratch-local files owned by a single task
struct TaskPaths {
    archive: PathBuf,
    extract: PathBuf,
}

impl TaskPaths {
    fn new(scratch: &Path) -> Self {
        let id = Uuid::new_v4().simple();
        Self {
            archive: scratch.join(format!(".download-{id}")),
            extract: scratch.join(format!(".extract-{id}")),
        }
    }

    async fn remove(&self) -> Result<(), Error> {
        remove_file_if_exists(&self.archive).await?;
        remove_dir_if_exists(&self.extract).await
    }
}

/// Install one package into the scratch workspace
pub(crate) async fn run_package_task(args: PackageTaskArgs) -> TaskOutcome {
    let PackageTaskArgs {
        index,
        package,
        scratch,
        client,
        deadline,
        context,
        progress,
        semaphore,
    } = args;

    let _permit = match semaphore {
        Some(semaphore) => match acquire_semaphore_permit(semaphore, &package.name).await {
            Ok(permit) => Some(permit),
            Err(e) => {
                return TaskOutcome {
                    index,
                    result: Err(e),
                }
            }
        },
        None => None,
    };

    let start = Instant::now();
    context.emit_for(
        package.name.clone(),
        AppEvent::Install(InstallEvent::PackageStarted {
            package: package.name.clone(),
            version: package.version.clone(),
        }),
    );

    let paths = TaskPaths::new(&scratch);
    let result = install_package(&package, &scratch, &paths, &client, deadline, &context).await;

    let result = match result {
        Ok(installed) => {
            context.emit_for(
                package.name.clone(),
                AppEvent::Install(InstallEvent::PackageCompleted {
                    package: package.name.clone(),
                    version: package.version.clone(),
                    path: installed.clone(),
                    duration: start.elapsed(),
                }),
            );
            progress.increment();
            Ok(installed)
        }
        Err((phase, err)) => {
            if let Err(e) = paths.remove().await {
                tracing::warn!(package = %package.name, error = %e, "leftover task files in scratch workspace");
                context.emit_warning_with_context(
                    format!("leftover files from {} in scratch workspace", package.name),
                    e.to_string(),
                );
            }
            tracing::debug!(package = %package.name, %phase, error = %err, "package task failed");
            context.emit_for(
                package.name.clone(),
                AppEvent::Install(InstallEvent::PackageFailed {
                    package: package.name.clone(),
                    version: package.version.clone(),
                    phase,
                    failure: FailureContext::from_error(&err),
                }),
            );
            Err(err)
        }
    };

    TaskOutcome { index, result }
}

async fn install_package(
    package: &Package,
    scratch: &Path,
    paths: &TaskPaths,
    client: &NetClient,
    deadline: Option<Duration>,
    context: &InstallContext,
) -> PhaseResult<PathBuf> {
    let (namespace, leaf) = package
        .namespace_and_leaf()
        .map_err(at(InstallPhase::Relocate))?;

    ensure_running(context, InstallPhase::Fetch)?;
    Download::new(package.archive_url())
        .map_err(at(InstallPhase::Fetch))?
        .for_package(package.name.clone())
        .with_deadline(deadline)
        .execute(client, &paths.archive, &context.cancel, context)
        .await
        .map_err(at(InstallPhase::Fetch))?;

    ensure_running(context, InstallPhase::Inspect)?;
    let info = archive::inspect(&paths.archive)
        .await
        .map_err(at(InstallPhase::Inspect))?;

    ensure_running(context, InstallPhase::Extract)?;
    archive::extract(&paths.archive, info.format, &paths.extract)
        .await
        .map_err(at(InstallPhase::Extract))?;

    ensure_running(context, InstallPhase::Relocate)?;
    let namespace_dir = scratch.join(namespace);
    fs::create_dir_all(&namespace_dir)
        .await
        .map_err(|e| InstallError::filesystem("create namespace directory", &namespace_dir, &e))
        .map_err(at(InstallPhase::Relocate))?;

    let extracted_root = paths.extract.join(&info.root);
    let destination = namespace_dir.join(leaf);
    fs::rename(&extracted_root, &destination)
        .await
        .map_err(|e| InstallError::filesystem("relocate package root", &destination, &e))
        .map_err(at(InstallPhase::Relocate))?;

    if let Err(e) = paths.remove().await {
        // A half-cleaned package must not be published as installed
        if let Err(cleanup) = remove_dir_if_exists(&destination).await {
            tracing::warn!(path = %destination.display(), error = %cleanup, "failed to remove relocated package");
            context.emit_warning_with_context(
                format!("failed to remove relocated {}", package.name),
                destination.display().to_string(),
            );
        }
        return Err((InstallPhase::Cleanup, e));
    }

    tracing::debug!(package = %package.name, path = %destination.display(), "package relocated");
    Ok(destination)
}

fn ensure_running(context: &InstallContext, phase: InstallPhase) -> PhaseResult<()> {
    if context.cancel.is_cancelled() {
        Err((phase, InstallError::Cancelled.into()))
    } else {
        Ok(())
    }
}

async fn remove_file_if_exists(path: &Path) -> Result<(), Error> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(InstallError::filesystem("remove archive", path, &e).into()),
    }
}

async fn remove_dir_if_exists(path: &Path) -> Result<(), Error> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(InstallError::filesystem("remove directory", path, &e).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pinstall_errors::ArchiveError;
    use pinstall_events::channel;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn zip_with_root(root: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.add_directory(format!("{root}/"), options).unwrap();
        writer
            .start_file(format!("{root}/composer.json"), options)
            .unwrap();
        writer.write_all(b"{}").unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn git_tarball(root: &str) -> Vec<u8> {
        let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let comment = b"52 comment=9f8e7d6c5b4a39281706f5e4d3c2b1a09f8e7d6c\n";
        let mut pax = tar::Header::new_ustar();
        pax.set_entry_type(tar::EntryType::XGlobalHeader);
        pax.set_size(comment.len() as u64);
        builder
            .append_data(&mut pax, "pax_global_header", &comment[..])
            .unwrap();

        let mut file = tar::Header::new_ustar();
        file.set_size(2);
        file.set_mode(0o644);
        builder
            .append_data(&mut file, format!("{root}/composer.json"), &b"{}"[..])
            .unwrap();

        builder.into_inner().unwrap().finish().unwrap()
    }

    fn args(package: Package, scratch: &Path, context: InstallContext) -> PackageTaskArgs {
        PackageTaskArgs {
            index: 0,
            package,
            scratch: scratch.to_path_buf(),
            client: NetClient::with_defaults().unwrap(),
            deadline: None,
            context,
            progress: ProgressCounter::new("test", 1, None),
            semaphore: None,
        }
    }

    fn scratch_entries(scratch: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(scratch)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_relocates_into_namespace() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/semver.zip");
            then.status(200).body(zip_with_root("composer-semver-abc123"));
        });
        let scratch = tempfile::tempdir().unwrap();
        let (tx, mut rx) = channel();
        let context = InstallContext::new().with_event_sender(tx);
        let package = Package::new("composer/semver", "3.4.0", server.url("/semver.zip"));

        let outcome = run_package_task(args(package, scratch.path(), context)).await;

        let installed = outcome.result.unwrap();
        assert_eq!(installed, scratch.path().join("composer/semver"));
        assert!(installed.join("composer.json").is_file());
        assert_eq!(scratch_entries(scratch.path()), vec!["composer"]);

        let mut completed = false;
        while let Ok(message) = rx.try_recv() {
            if let AppEvent::Install(InstallEvent::PackageCompleted { package, .. }) = message.event
            {
                assert_eq!(package, "composer/semver");
                assert_eq!(message.meta.correlation_id.as_deref(), Some("composer/semver"));
                completed = true;
            }
        }
        assert!(completed);
    }

    #[tokio::test]
    async fn test_relocates_git_tarball() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/log.tar.gz");
            then.status(200).body(git_tarball("php-fig-log-f16e1d5"));
        });
        let scratch = tempfile::tempdir().unwrap();
        let package = Package::new("psr/log", "3.0.0", server.url("/log.tar.gz"));

        let outcome = run_package_task(args(package, scratch.path(), InstallContext::new())).await;

        let installed = outcome.result.unwrap();
        assert_eq!(installed, scratch.path().join("psr/log"));
        assert!(installed.join("composer.json").is_file());
        assert_eq!(scratch_entries(scratch.path()), vec!["psr"]);
    }

    #[tokio::test]
    async fn test_empty_archive_fails_in_inspect() {
        let server = MockServer::start_async().await;
        let empty = zip::ZipWriter::new(Cursor::new(Vec::new()))
            .finish()
            .unwrap()
            .into_inner();
        server.mock(|when, then| {
            when.method(GET).path("/empty.zip");
            then.status(200).body(empty);
        });
        let scratch = tempfile::tempdir().unwrap();
        let (tx, mut rx) = channel();
        let context = InstallContext::new().with_event_sender(tx);
        let package = Package::new("acme/empty", "1.0.0", server.url("/empty.zip"));

        let outcome = run_package_task(args(package, scratch.path(), context)).await;

        assert!(matches!(
            outcome.result,
            Err(Error::Archive(ArchiveError::Empty { .. }))
        ));
        assert!(scratch_entries(scratch.path()).is_empty());

        let phase = std::iter::from_fn(|| rx.try_recv().ok()).find_map(|m| match m.event {
            AppEvent::Install(InstallEvent::PackageFailed { phase, .. }) => Some(phase),
            _ => None,
        });
        assert_eq!(phase, Some(InstallPhase::Inspect));
    }

    #[tokio::test]
    async fn test_invalid_name_fails_before_fetch() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/a.zip");
            then.status(200).body(zip_with_root("a"));
        });
        let scratch = tempfile::tempdir().unwrap();
        let package = Package::new("no-namespace", "1.0.0", server.url("/a.zip"));

        let outcome = run_package_task(args(package, scratch.path(), InstallContext::new())).await;

        assert!(matches!(
            outcome.result,
            Err(Error::Install(InstallError::InvalidPackageName { .. }))
        ));
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_cancelled_task_does_not_fetch() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/a.zip");
            then.status(200).body(zip_with_root("a"));
        });
        let scratch = tempfile::tempdir().unwrap();
        let context = InstallContext::new();
        context.cancel.cancel();
        let package = Package::new("acme/a", "1.0.0", server.url("/a.zip"));

        let outcome = run_package_task(args(package, scratch.path(), context)).await;

        assert!(outcome.result.unwrap_err().is_cancelled());
        mock.assert_hits(0);
    }
}
