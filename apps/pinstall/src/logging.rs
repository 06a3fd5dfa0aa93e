//! Tracing setup and structured logging of received events

use pinstall_events::{
    AppEvent, DownloadEvent, EventMessage, GeneralEvent, InstallEvent, ProgressEvent,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

const DEBUG_FILTER: &str = "info,pinstall=debug,pinstall_install=debug,pinstall_net=debug";
const DEFAULT_FILTER: &str = "warn";

/// Initialize tracing/logging
///
/// JSON output mode keeps stdout clean and disables logging unless debug
/// is requested, in which case JSON records go to stderr.
pub fn init_tracing(json_mode: bool, debug_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_flag;

    if debug_enabled {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEBUG_FILTER)),
            )
            .init();
    } else if json_mode {
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::new(DEFAULT_FILTER))
            .init();
    }
}

/// Emit a tracing record at a level chosen at runtime
macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::error!($($arg)+);
        } else if level == Level::WARN {
            tracing::warn!($($arg)+);
        } else if level == Level::INFO {
            tracing::info!($($arg)+);
        } else if level == Level::DEBUG {
            tracing::debug!($($arg)+);
        } else {
            tracing::trace!($($arg)+);
        }
    }};
}

/// Log an event using the tracing infrastructure with structured fields
#[allow(clippy::too_many_lines)]
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    let level = meta.tracing_level();

    match &message.event {
        AppEvent::General(GeneralEvent::Warning { message, context }) => log_at!(
            level,
            source = meta.source.as_str(),
            event_id = %meta.event_id,
            context = ?context,
            "{message}"
        ),

        AppEvent::Download(event) => match event {
            DownloadEvent::Started {
                url,
                package,
                total_size,
            } => log_at!(
                level,
                source = meta.source.as_str(),
                correlation = ?meta.correlation_id,
                url = %url,
                package = ?package,
                total_size = ?total_size,
                "Download started"
            ),
            DownloadEvent::Completed {
                url,
                package,
                final_size,
                total_time,
            } => log_at!(
                level,
                source = meta.source.as_str(),
                correlation = ?meta.correlation_id,
                url = %url,
                package = ?package,
                bytes = final_size,
                elapsed_ms = u64::try_from(total_time.as_millis()).unwrap_or(u64::MAX),
                "Download completed"
            ),
            DownloadEvent::Failed {
                url,
                package,
                failure,
                bytes_downloaded,
            } => log_at!(
                level,
                source = meta.source.as_str(),
                correlation = ?meta.correlation_id,
                url = %url,
                package = ?package,
                bytes = bytes_downloaded,
                retryable = failure.retryable,
                code = ?failure.code,
                "Download failed: {}",
                failure.message
            ),
        },

        AppEvent::Install(event) => match event {
            InstallEvent::BatchStarted {
                target,
                scratch,
                package_count,
            } => log_at!(
                level,
                source = meta.source.as_str(),
                target = %target.display(),
                scratch = %scratch.display(),
                packages = package_count,
                "Install started"
            ),
            InstallEvent::PackageStarted { package, version } => log_at!(
                level,
                source = meta.source.as_str(),
                package = %package,
                version = %version,
                "Package install started"
            ),
            InstallEvent::PackageCompleted {
                package,
                version,
                path,
                duration,
            } => log_at!(
                level,
                source = meta.source.as_str(),
                package = %package,
                version = %version,
                path = %path.display(),
                elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                "Package installed"
            ),
            InstallEvent::PackageFailed {
                package,
                version,
                phase,
                failure,
            } => log_at!(
                level,
                source = meta.source.as_str(),
                package = %package,
                version = %version,
                phase = %phase,
                code = ?failure.code,
                retryable = failure.retryable,
                "Package install failed: {}",
                failure.message
            ),
            InstallEvent::Published {
                target,
                package_count,
            } => log_at!(
                level,
                source = meta.source.as_str(),
                target = %target.display(),
                packages = package_count,
                "Target published"
            ),
            InstallEvent::ManifestWritten { path, entries } => log_at!(
                level,
                source = meta.source.as_str(),
                path = %path.display(),
                entries = entries,
                "Manifest written"
            ),
            InstallEvent::BatchCompleted {
                target,
                installed,
                failed,
                duration,
            } => log_at!(
                level,
                source = meta.source.as_str(),
                target = %target.display(),
                installed = installed,
                failed = failed,
                elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                "Install completed"
            ),
        },

        AppEvent::Progress(event) => match event {
            ProgressEvent::Started { id, operation, total } => log_at!(
                level,
                source = meta.source.as_str(),
                id = %id,
                total = ?total,
                "{operation}"
            ),
            ProgressEvent::Updated { id, current, total } => log_at!(
                level,
                source = meta.source.as_str(),
                id = %id,
                current = current,
                total = ?total,
                "Progress updated"
            ),
            ProgressEvent::Completed {
                id,
                total_processed,
                ..
            } => log_at!(
                level,
                source = meta.source.as_str(),
                id = %id,
                processed = total_processed,
                "Progress completed"
            ),
            ProgressEvent::Failed {
                id,
                failure,
                completed_items,
            } => log_at!(
                level,
                source = meta.source.as_str(),
                id = %id,
                completed = completed_items,
                "Progress failed: {}",
                failure.message
            ),
        },
    }
}
