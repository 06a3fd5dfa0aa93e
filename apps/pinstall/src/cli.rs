//! Command line interface definition

use clap::{Parser, Subcommand};
use pinstall_types::ColorChoice;
use std::path::PathBuf;

/// pinstall - concurrent installer for composer.lock package sets
#[derive(Parser)]
#[command(name = "pinstall")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Concurrent installer for composer.lock package sets")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Project directory or lockfile to work from
    #[arg(short = 'f', long = "file", global = true, value_name = "PATH", default_value = ".")]
    pub file: PathBuf,

    /// Do not write progress or summaries
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging as JSON on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Install the packages locked to this project
    ///
    /// A composer.lock file must be present; nothing is resolved or updated.
    #[command(alias = "i")]
    Install {
        /// Skip development packages
        #[arg(long)]
        no_dev: bool,

        /// Accept a lockfile with any name, or composer.json when no lockfile exists
        #[arg(long)]
        force: bool,

        /// Publish the packages that installed when others fail
        #[arg(long)]
        keep_going: bool,

        /// Maximum concurrent package downloads (0 = no limit)
        #[arg(short = 'j', long = "jobs", value_name = "N")]
        jobs: Option<usize>,

        /// Per-archive download deadline in seconds (0 = none)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// List the packages locked to this project
    Show {
        /// Skip development packages
        #[arg(long)]
        no_dev: bool,

        /// Accept a lockfile with any name
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_install_flags() {
        let cli = Cli::try_parse_from([
            "pinstall", "-q", "-f", "app", "install", "--no-dev", "--keep-going", "-j", "4",
            "--timeout", "30",
        ])
        .unwrap();

        assert!(cli.global.quiet);
        assert_eq!(cli.global.file, PathBuf::from("app"));
        match cli.command {
            Commands::Install {
                no_dev,
                force,
                keep_going,
                jobs,
                timeout,
            } => {
                assert!(no_dev);
                assert!(!force);
                assert!(keep_going);
                assert_eq!(jobs, Some(4));
                assert_eq!(timeout, Some(30));
            }
            Commands::Show { .. } => panic!("expected install"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pinstall", "show", "--json", "--color", "never"]).unwrap();
        assert!(cli.global.json);
        assert_eq!(cli.global.color, Some(ColorChoice::Never));
        assert_eq!(cli.global.file, PathBuf::from("."));
    }
}
