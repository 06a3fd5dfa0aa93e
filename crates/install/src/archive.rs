//! Archive inspection and extraction
//!
//! Formats are recognised by their leading bytes rather than by file name,
//! since downloaded archives are stored under generated names.

use std::ffi::OsString;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use pinstall_errors::{ArchiveError, Error, InstallError};
use tar::Archive as TarArchive;
use tokio::task;

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    Tar,
}

/// Result of inspecting an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    pub format: ArchiveFormat,
    /// Name of the first top-level entry, taken as the package root
    pub root: OsString,
}

const ZIP_MAGIC: [&[u8; 4]; 3] = [b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"];
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const TAR_MAGIC_OFFSET: usize = 257;
const TAR_MAGIC: &[u8; 5] = b"ustar";

/// Detect the format from the first bytes of a file
#[must_use]
pub fn detect_format(header: &[u8]) -> Option<ArchiveFormat> {
    if ZIP_MAGIC.iter().any(|magic| header.starts_with(*magic)) {
        Some(ArchiveFormat::Zip)
    } else if header.starts_with(&GZIP_MAGIC) {
        Some(ArchiveFormat::TarGz)
    } else if header
        .get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len())
        .is_some_and(|magic| magic == TAR_MAGIC)
    {
        Some(ArchiveFormat::Tar)
    } else {
        None
    }
}

/// Identify the format and the root entry of an archive
///
/// # Errors
///
/// Returns `ArchiveError::UnrecognizedFormat` for unknown formats,
/// `ArchiveError::Empty` when there are no entries and
/// `ArchiveError::Corrupt` when the listing cannot be read.
pub async fn inspect(archive_path: &Path) -> Result<ArchiveInfo, Error> {
    let archive_path = archive_path.to_path_buf();
    task::spawn_blocking(move || inspect_blocking(&archive_path))
        .await
        .map_err(|e| InstallError::TaskError {
            message: format!("archive inspection task failed: {e}"),
        })?
}

/// Unpack the whole archive into `dest_dir`, creating it if needed
///
/// # Errors
///
/// Returns `ArchiveError::ExtractionFailed` or `ArchiveError::Corrupt` when
/// unpacking fails.
pub async fn extract(archive_path: &Path, format: ArchiveFormat, dest_dir: &Path) -> Result<(), Error> {
    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(|e| InstallError::filesystem("create extraction directory", dest_dir, &e))?;

    let archive_path = archive_path.to_path_buf();
    let dest_dir = dest_dir.to_path_buf();
    task::spawn_blocking(move || match format {
        ArchiveFormat::Zip => extract_zip(&archive_path, &dest_dir),
        ArchiveFormat::TarGz => {
            let file = open(&archive_path)?;
            unpack_tar(TarArchive::new(GzDecoder::new(file)), &archive_path, &dest_dir)
        }
        ArchiveFormat::Tar => {
            let file = open(&archive_path)?;
            unpack_tar(TarArchive::new(file), &archive_path, &dest_dir)
        }
    })
    .await
    .map_err(|e| InstallError::TaskError {
        message: format!("archive extraction task failed: {e}"),
    })?
}

fn inspect_blocking(archive_path: &Path) -> Result<ArchiveInfo, Error> {
    let mut file = open(archive_path)?;
    let mut header = Vec::with_capacity(TAR_MAGIC_OFFSET + TAR_MAGIC.len());
    (&mut file)
        .take((TAR_MAGIC_OFFSET + TAR_MAGIC.len()) as u64)
        .read_to_end(&mut header)
        .map_err(|e| corrupt(archive_path, &e))?;
    file.seek(SeekFrom::Start(0))
        .map_err(|e| corrupt(archive_path, &e))?;

    let format = detect_format(&header).ok_or_else(|| ArchiveError::UnrecognizedFormat {
        path: archive_path.display().to_string(),
    })?;

    let first_entry = match format {
        ArchiveFormat::Zip => first_zip_entry(file, archive_path)?,
        ArchiveFormat::TarGz => first_tar_entry(TarArchive::new(GzDecoder::new(file)), archive_path)?,
        ArchiveFormat::Tar => first_tar_entry(TarArchive::new(file), archive_path)?,
    };

    let first_entry = first_entry.ok_or_else(|| ArchiveError::Empty {
        path: archive_path.display().to_string(),
    })?;

    let root = top_level(&first_entry).ok_or_else(|| ArchiveError::Corrupt {
        path: archive_path.display().to_string(),
        message: format!("entry {} has no usable top-level name", first_entry.display()),
    })?;

    Ok(ArchiveInfo { format, root })
}

fn first_zip_entry(file: File, archive_path: &Path) -> Result<Option<PathBuf>, Error> {
    let mut archive = zip::ZipArchive::new(file).map_err(|e| corrupt(archive_path, &e))?;
    if archive.is_empty() {
        return Ok(None);
    }
    let entry = archive.by_index(0).map_err(|e| corrupt(archive_path, &e))?;
    Ok(Some(PathBuf::from(entry.name())))
}

fn first_tar_entry<R: Read>(
    mut archive: TarArchive<R>,
    archive_path: &Path,
) -> Result<Option<PathBuf>, Error> {
    let entries = archive.entries().map_err(|e| corrupt(archive_path, &e))?;
    for entry in entries {
        let entry = entry.map_err(|e| corrupt(archive_path, &e))?;
        if is_metadata_entry(entry.header().entry_type()) {
            continue;
        }
        let path = entry.path().map_err(|e| corrupt(archive_path, &e))?;
        return Ok(Some(path.into_owned()));
    }
    Ok(None)
}

/// Header-only entries such as the `pax_global_header` written by `git archive`
fn is_metadata_entry(kind: tar::EntryType) -> bool {
    kind.is_pax_global_extensions()
        || kind.is_pax_local_extensions()
        || kind.is_gnu_longname()
        || kind.is_gnu_longlink()
}

/// First normal component of an entry path, skipping `./`
fn top_level(entry: &Path) -> Option<OsString> {
    for component in entry.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(name) => return Some(name.to_os_string()),
            _ => return None,
        }
    }
    None
}

fn unpack_tar<R: Read>(
    mut archive: TarArchive<R>,
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<(), Error> {
    archive.unpack(dest_dir).map_err(|e| {
        ArchiveError::ExtractionFailed {
            path: archive_path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<(), Error> {
    let file = open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| corrupt(archive_path, &e))?;
    let failed = |e: &dyn std::fmt::Display| ArchiveError::ExtractionFailed {
        path: archive_path.display().to_string(),
        message: e.to_string(),
    };

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| corrupt(archive_path, &e))?;

        // Entries escaping the destination are skipped
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let outpath = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath).map_err(|e| failed(&e))?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent).map_err(|e| failed(&e))?;
            }
            let mut outfile = File::create(&outpath).map_err(|e| failed(&e))?;
            std::io::copy(&mut entry, &mut outfile).map_err(|e| failed(&e))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
            }
        }
    }

    Ok(())
}

fn open(archive_path: &Path) -> Result<File, Error> {
    File::open(archive_path).map_err(|e| Error::io_with_path(&e, archive_path))
}

fn corrupt(archive_path: &Path, error: &dyn std::fmt::Display) -> Error {
    ArchiveError::Corrupt {
        path: archive_path.display().to_string(),
        message: error.to_string(),
    }
    .into()
}
