//! pinstall - concurrent installer for composer.lock package sets
//!
//! This is the CLI application. It loads configuration and the lockfile,
//! drives the installer, and renders events and results.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::{OperationResult, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use pinstall_config::Config;
use pinstall_events::{EventReceiver, EventSender};
use pinstall_install::{FailurePolicy, InstallConfig, InstallContext, Installer};
use pinstall_lockfile::Lockfile;
use pinstall_net::{NetClient, NetConfig};
use pinstall_types::ColorChoice;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const PROGRESS_TICK: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    logging::init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if json_mode {
            match serde_json::to_string_pretty(&e.failure_context()) {
                Ok(json) => println!("{{\"error\": {json}}}"),
                Err(_) => eprintln!("Error: {e}"),
            }
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Everything a command needs to run
struct CommandContext {
    config: Config,
    file: PathBuf,
    event_sender: EventSender,
    cancel: CancellationToken,
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting pinstall v{}", env!("CARGO_PKG_VERSION"));

    // 1. File config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref())
        .await
        .map_err(CliError::Config)?;

    // 2. Environment variables
    config.merge_env().map_err(CliError::Config)?;

    // 3. CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global, &cli.command);

    apply_color_choice(config.general.color);

    let (event_sender, event_receiver) = pinstall_events::channel();
    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let renderer = OutputRenderer::new(cli.global.json, config.general.quiet, config.general.color);
    let show_output = !config.general.quiet && !cli.global.json;
    let mut event_handler = EventHandler::new(show_output, show_output);

    let ctx = CommandContext {
        config,
        file: cli.global.file,
        event_sender,
        cancel,
    };

    let result =
        execute_command_with_events(cli.command, ctx, event_receiver, &mut event_handler).await?;

    renderer.render_result(&result)?;

    if let OperationResult::InstallReport(report) = &result {
        if !report.is_complete() {
            return Err(CliError::Incomplete {
                failed: report.failed.len(),
            });
        }
    }

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ctx: CommandContext,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ctx));
    let mut ticker = tokio::time::interval(PROGRESS_TICK);

    loop {
        select! {
            // Command completed
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            // Event received
            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }

            _ = ticker.tick(), if event_handler.is_drawing() => event_handler.tick(),
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, ctx: CommandContext) -> Result<OperationResult, CliError> {
    match command {
        Commands::Install { force, .. } => {
            let lockfile = Lockfile::load(&ctx.file, force).await?;
            let packages = lockfile.package_set(!ctx.config.install.no_dev);
            info!(
                lockfile = %lockfile.path().display(),
                packages = packages.len(),
                "installing from lockfile"
            );

            let client = NetClient::new(NetConfig {
                connect_timeout: ctx.config.connect_timeout(),
                user_agent: ctx.config.network.user_agent.clone(),
                ..NetConfig::default()
            })?;
            let policy = if ctx.config.install.keep_going {
                FailurePolicy::Continue
            } else {
                FailurePolicy::Abort
            };
            let install_config = InstallConfig::default()
                .with_concurrency(ctx.config.install.concurrency)
                .with_fetch_timeout(ctx.config.fetch_timeout())
                .with_failure_policy(policy);

            let context = InstallContext::new()
                .with_quiet(ctx.config.general.quiet)
                .with_event_sender(ctx.event_sender)
                .with_cancel_token(ctx.cancel);

            let report = Installer::new(install_config, client)
                .install(&packages, lockfile.dir(), &context)
                .await?;
            Ok(OperationResult::InstallReport(report))
        }

        Commands::Show { no_dev, force } => {
            let lockfile = Lockfile::load(&ctx.file, force).await?;
            let include_dev = !(no_dev || ctx.config.install.no_dev);
            let packages = lockfile.package_set(include_dev);
            Ok(OperationResult::PackageList(packages.packages().to_vec()))
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs, command: &Commands) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if global.quiet {
        config.general.quiet = true;
    }

    if let Commands::Install {
        no_dev,
        keep_going,
        jobs,
        timeout,
        ..
    } = command
    {
        if *no_dev {
            config.install.no_dev = true;
        }
        if *keep_going {
            config.install.keep_going = true;
        }
        if let Some(jobs) = jobs {
            config.install.concurrency = *jobs;
        }
        if let Some(timeout) = timeout {
            config.network.timeout = *timeout;
        }
    }
}

fn apply_color_choice(choice: ColorChoice) {
    match choice {
        ColorChoice::Always => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        }
        ColorChoice::Never => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        ColorChoice::Auto => {}
    }
}

/// Cancel the run on Ctrl-C; in-flight downloads stop and nothing is published
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::try_parse_from([
            "pinstall",
            "--color",
            "never",
            "-q",
            "install",
            "--no-dev",
            "--keep-going",
            "-j",
            "3",
            "--timeout",
            "15",
        ])
        .unwrap();
        let mut config = Config::default();

        apply_cli_config(&mut config, &cli.global, &cli.command);

        assert_eq!(config.general.color, ColorChoice::Never);
        assert!(config.general.quiet);
        assert!(config.install.no_dev);
        assert!(config.install.keep_going);
        assert_eq!(config.concurrency_limit(), Some(3));
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let cli = Cli::try_parse_from(["pinstall", "install"]).unwrap();
        let mut config = Config::default();
        config.install.concurrency = 8;
        config.network.timeout = 60;

        apply_cli_config(&mut config, &cli.global, &cli.command);

        assert_eq!(config.concurrency_limit(), Some(8));
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(60)));
        assert!(!config.install.keep_going);
    }
}
