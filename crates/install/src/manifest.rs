//! Installed manifest writer

use std::path::{Path, PathBuf};

use pinstall_errors::{Error, InstallError};
use pinstall_types::Package;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tokio::fs;

/// Directory inside the target holding installer metadata
pub const MANIFEST_DIR: &str = "composer";
/// Manifest file name
pub const MANIFEST_FILE: &str = "installed.json";

/// Render packages as a 4-space indented JSON array with a trailing newline
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_manifest(packages: &[Package]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    packages.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

/// Write `<target_dir>/composer/installed.json`, replacing any previous file
///
/// # Errors
///
/// Returns `InstallError::FilesystemError` if the directory or file cannot be written.
pub async fn write_manifest(target_dir: &Path, packages: &[Package]) -> Result<PathBuf, Error> {
    let dir = target_dir.join(MANIFEST_DIR);
    fs::create_dir_all(&dir)
        .await
        .map_err(|e| InstallError::filesystem("create manifest directory", &dir, &e))?;

    let path = dir.join(MANIFEST_FILE);
    let contents = render_manifest(packages)?;
    fs::write(&path, contents)
        .await
        .map_err(|e| InstallError::filesystem("write manifest", &path, &e))?;

    tracing::debug!(path = %path.display(), entries = packages.len(), "manifest written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_manifest() {
        assert_eq!(render_manifest(&[]).unwrap(), b"[]\n");
    }

    #[test]
    fn test_four_space_indent() {
        let package = Package::new("psr/log", "3.0.0", "https://example.com/log.zip");
        let rendered = String::from_utf8(render_manifest(&[package]).unwrap()).unwrap();

        assert!(rendered.starts_with("[\n    {\n        \"name\": \"psr/log\",\n"));
        assert!(rendered.ends_with("}\n]\n"));
    }

    #[tokio::test]
    async fn test_write_is_stable_and_overwrites() {
        let target = tempfile::tempdir().unwrap();
        let packages = vec![
            Package::new("psr/log", "3.0.0", "https://example.com/log.zip"),
            Package::new("composer/semver", "3.4.0", "https://example.com/semver.zip"),
        ];

        let path = write_manifest(target.path(), &packages).await.unwrap();
        let first = std::fs::read(&path).unwrap();
        let again = write_manifest(target.path(), &packages).await.unwrap();
        assert_eq!(path, again);
        assert_eq!(std::fs::read(&path).unwrap(), first);

        write_manifest(target.path(), &[]).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"[]\n");
    }
}
