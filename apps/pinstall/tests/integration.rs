//! Integration tests for pinstall CLI

use std::path::Path;
use std::process::{Command, Output};

const LOCKFILE: &str = r#"{
    "_readme": ["This file locks the dependencies of your project to a known state"],
    "content-hash": "d41d8cd98f00b204e9800998ecf8427e",
    "packages": [
        {
            "name": "psr/log",
            "version": "3.0.0",
            "dist": {
                "type": "zip",
                "url": "http://127.0.0.1:9/psr-log.zip",
                "reference": "fe5ea303b0887d5caefd3d431c3e61ad47037001",
                "shasum": ""
            },
            "description": "Common interface for logging libraries"
        }
    ],
    "packages-dev": [
        {
            "name": "phpunit/php-timer",
            "version": "6.0.0",
            "dist": {
                "type": "zip",
                "url": "http://127.0.0.1:9/php-timer.zip",
                "reference": "e2a2d67966e740530f4a3343fe2e030ffdc1161d",
                "shasum": ""
            },
            "description": "Utility class for timing"
        }
    ]
}"#;

const EMPTY_LOCKFILE: &str = r#"{"packages": [], "packages-dev": []}"#;

/// Run the binary with configuration isolated to `home`
fn pinstall(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pinstall"))
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("PINSTALL_QUIET")
        .env_remove("PINSTALL_NO_DEV")
        .env_remove("PINSTALL_COLOR")
        .env_remove("PINSTALL_CONCURRENCY")
        .env_remove("PINSTALL_TIMEOUT")
        .output()
        .expect("Failed to execute pinstall")
}

fn project_with(lockfile: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("composer.lock"), lockfile).unwrap();
    dir
}

#[test]
fn test_cli_version() {
    let home = tempfile::tempdir().unwrap();
    let output = pinstall(home.path(), &["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pinstall"));
}

#[test]
fn test_cli_help() {
    let home = tempfile::tempdir().unwrap();
    let output = pinstall(home.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("install"));
    assert!(stdout.contains("show"));
}

#[test]
fn test_cli_invalid_command() {
    let home = tempfile::tempdir().unwrap();
    let output = pinstall(home.path(), &["invalid-command"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_install_without_lockfile_fails() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let dir = project.path().to_str().unwrap();

    let output = pinstall(home.path(), &["-f", dir, "install"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no valid composer.lock file found"));
    assert!(!project.path().join("vendor").exists());
}

#[test]
fn test_show_lists_packages() {
    let home = tempfile::tempdir().unwrap();
    let project = project_with(LOCKFILE);
    let dir = project.path().to_str().unwrap();

    let output = pinstall(home.path(), &["-f", dir, "show", "--color", "never"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("NAME"));
    assert!(stdout.contains("psr/log"));
    assert!(stdout.contains("phpunit/php-timer"));

    let output = pinstall(home.path(), &["-f", dir, "show", "--no-dev"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("psr/log"));
    assert!(!stdout.contains("phpunit/php-timer"));
}

#[test]
fn test_show_json() {
    let home = tempfile::tempdir().unwrap();
    let project = project_with(LOCKFILE);
    let lockfile = project.path().join("composer.lock");

    let output = pinstall(
        home.path(),
        &["--json", "-f", lockfile.to_str().unwrap(), "show"],
    );

    assert!(output.status.success());
    let packages: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = packages
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["psr/log", "phpunit/php-timer"]);
}

#[test]
fn test_install_empty_lockfile_writes_manifest() {
    let home = tempfile::tempdir().unwrap();
    let project = project_with(EMPTY_LOCKFILE);
    let dir = project.path().to_str().unwrap();

    let output = pinstall(home.path(), &["-f", dir, "install"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Installed 0 packages"));
    let manifest = project.path().join("vendor/composer/installed.json");
    assert_eq!(std::fs::read(manifest).unwrap(), b"[]\n");
}

#[test]
fn test_quiet_install_prints_nothing() {
    let home = tempfile::tempdir().unwrap();
    let project = project_with(EMPTY_LOCKFILE);
    let dir = project.path().to_str().unwrap();

    let output = pinstall(home.path(), &["-q", "-f", dir, "install"]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unreachable_archive_aborts_install() {
    let home = tempfile::tempdir().unwrap();
    let project = project_with(LOCKFILE);
    let dir = project.path().to_str().unwrap();

    let output = pinstall(home.path(), &["--json", "-f", dir, "install", "--no-dev"]);

    assert_eq!(output.status.code(), Some(1));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["error"]["code"], "install.packages_failed");
    assert!(body["error"]["message"].as_str().unwrap().contains("psr/log"));
    assert!(!project.path().join("vendor").exists());
}

#[test]
fn test_invalid_config_file_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let project = project_with(EMPTY_LOCKFILE);
    let config = home.path().join("bad.toml");
    std::fs::write(&config, "[install\nconcurrency = ").unwrap();

    let output = pinstall(
        home.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "-f",
            project.path().to_str().unwrap(),
            "install",
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"));
}
