//! Install orchestrator

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use pinstall_errors::{Error, InstallError};
use pinstall_events::{AppEvent, EventEmitter, FailureContext, InstallEvent, ProgressCounter};
use pinstall_net::NetClient;
use pinstall_types::{InstallReport, InstalledPackage, Package, PackageFailure, PackageSet};
use tokio::task::JoinSet;

use crate::config::{FailurePolicy, InstallConfig};
use crate::context::InstallContext;
use crate::limits::create_semaphore;
use crate::manifest::write_manifest;
use crate::task::{run_package_task, PackageTaskArgs, TaskOutcome};
use crate::workspace::ScratchWorkspace;

/// Installs a package set into `<project>/<target_dir>`
#[derive(Clone, Debug)]
pub struct Installer {
    config: InstallConfig,
    client: NetClient,
}

impl Installer {
    #[must_use]
    pub fn new(config: InstallConfig, client: NetClient) -> Self {
        Self { config, client }
    }

    #[must_use]
    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    /// Install every package in `packages`, then publish and write the manifest
    ///
    /// All packages are staged in a scratch workspace beside the target. The
    /// target is only replaced after every task has finished, and only when
    /// the failure policy allows it.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch workspace cannot be created, if the
    /// run is cancelled, if any package fails under `FailurePolicy::Abort`,
    /// or if publishing or writing the manifest fails.
    pub async fn install(
        &self,
        packages: &PackageSet,
        project_dir: &Path,
        context: &InstallContext,
    ) -> Result<InstallReport, Error> {
        let start = Instant::now();
        if context.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let target = project_dir.join(&self.config.target_dir);
        let workspace = ScratchWorkspace::create(project_dir, &target).await?;
        context.emit(AppEvent::Install(InstallEvent::BatchStarted {
            target: target.clone(),
            scratch: workspace.root().to_path_buf(),
            package_count: packages.len(),
        }));

        let progress = ProgressCounter::new(
            format!("installing {} packages", packages.len()),
            packages.len() as u64,
            context.progress_sender(),
        );

        let outcomes = self
            .run_tasks(packages, workspace.root(), context, &progress)
            .await;

        if context.cancel.is_cancelled() {
            let err = Error::Cancelled;
            progress.mark_failed(FailureContext::from_error(&err));
            context.emit_warning_with_context(
                "install cancelled, scratch workspace left in place",
                workspace.root().display().to_string(),
            );
            return Err(err);
        }

        let scratch = workspace.root().to_path_buf();
        let mut installed = Vec::new();
        let mut records: Vec<Package> = Vec::new();
        let mut failed = Vec::new();
        for (package, result) in outcomes {
            match result {
                Ok(path) => {
                    let relative = path.strip_prefix(&scratch).unwrap_or(&path);
                    installed.push(InstalledPackage {
                        name: package.name.clone(),
                        version: package.version.clone(),
                        path: target.join(relative),
                    });
                    records.push(package);
                }
                Err(error) => failed.push(PackageFailure {
                    name: package.name,
                    version: package.version,
                    error,
                }),
            }
        }

        if !failed.is_empty() && self.config.failure_policy == FailurePolicy::Abort {
            let names: Vec<&str> = failed.iter().map(|f| f.name.as_str()).collect();
            let err: Error = InstallError::PackagesFailed {
                count: failed.len(),
                packages: names.join(", "),
            }
            .into();
            progress.mark_failed(FailureContext::from_error(&err));
            context.emit_warning_with_context(
                "install aborted, scratch workspace left in place",
                scratch.display().to_string(),
            );
            return Err(err);
        }

        let target = workspace.publish().await?;
        context.emit(AppEvent::Install(InstallEvent::Published {
            target: target.clone(),
            package_count: installed.len(),
        }));

        let manifest = write_manifest(&target, &records).await?;
        context.emit(AppEvent::Install(InstallEvent::ManifestWritten {
            path: manifest.clone(),
            entries: records.len(),
        }));

        progress.mark_complete();
        let duration = start.elapsed();
        context.emit(AppEvent::Install(InstallEvent::BatchCompleted {
            target: target.clone(),
            installed: installed.len(),
            failed: failed.len(),
            duration,
        }));

        Ok(InstallReport {
            installed,
            failed,
            target,
            manifest,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Run one task per package and return the outcomes in set order
    async fn run_tasks(
        &self,
        packages: &PackageSet,
        scratch: &Path,
        context: &InstallContext,
        progress: &ProgressCounter,
    ) -> Vec<(Package, Result<PathBuf, Error>)> {
        let semaphore = self.config.concurrency.map(create_semaphore);
        let mut tasks = JoinSet::new();
        let mut spawned = HashMap::with_capacity(packages.len());

        for (index, package) in packages.iter().enumerate() {
            let handle = tasks.spawn(run_package_task(PackageTaskArgs {
                index,
                package: package.clone(),
                scratch: scratch.to_path_buf(),
                client: self.client.clone(),
                deadline: self.config.fetch_timeout,
                context: context.clone(),
                progress: progress.clone(),
                semaphore: semaphore.clone(),
            }));
            spawned.insert(handle.id(), index);
        }

        let mut slots: Vec<Option<Result<PathBuf, Error>>> =
            std::iter::repeat_with(|| None).take(packages.len()).collect();

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, TaskOutcome { index, result })) => slots[index] = Some(result),
                Err(join_error) => {
                    if let Some(&index) = spawned.get(&join_error.id()) {
                        slots[index] = Some(Err(InstallError::TaskError {
                            message: join_error.to_string(),
                        }
                        .into()));
                    }
                }
            }
        }

        packages
            .iter()
            .cloned()
            .zip(slots)
            .map(|(package, slot)| {
                let result = slot.unwrap_or_else(|| {
                    Err(InstallError::TaskError {
                        message: format!("no result for {}", package.name),
                    }
                    .into())
                });
                (package, result)
            })
            .collect()
    }
}
