// Archive reader - unpacks a world package and checks it is one

use crate::storage::{path_kind, PathKind};
use crate::validation::validate_world_dir_name;
use crate::worlds::error::{io_context, WorldError};
use crate::worlds::scratch::BlockingWorker;
use crate::worlds::IDENTITY_FILE;
use std::fs;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

/// A package unpacked into scratch space
#[derive(Debug, Clone)]
pub struct ExtractedPackage {
    pub root: PathBuf,
    /// Trimmed identity file content; authoritative over any caller-supplied label
    pub world_name: String,
    pub files_extracted: usize,
}

/// Unpack `payload` into `dest` and validate it as a world package. `dest` is
/// created here and its parent must exist. `worker` keeps the surrounding
/// scratch tree alive while the blocking extractor runs.
/// On any failure the partial extraction at `dest` is removed before the error is returned.
pub async fn extract_package(
    payload: Vec<u8>,
    dest: &Path,
    worker: BlockingWorker,
) -> Result<ExtractedPackage, WorldError> {
    if payload.is_empty() {
        return Err(WorldError::MalformedArchive("upload is empty".to_string()));
    }

    tracing::debug!("Extracting {} byte package into {}", payload.len(), dest.display());

    let result = unpack_and_validate(payload, dest, worker).await;
    if let Err(e) = &result {
        tracing::warn!("Discarding partial extraction at {}: {}", dest.display(), e);
        discard_partial(dest).await;
    }
    result
}

async fn unpack_and_validate(
    payload: Vec<u8>,
    dest: &Path,
    worker: BlockingWorker,
) -> Result<ExtractedPackage, WorldError> {
    tokio::fs::create_dir(dest)
        .await
        .map_err(io_context("creating extraction directory"))?;

    let target = dest.to_path_buf();
    let files_extracted = tokio::task::spawn_blocking(move || {
        extract_zip(Cursor::new(payload), &target, || worker.is_cancelled())
    })
    .await
    .map_err(|e| WorldError::MalformedArchive(format!("extraction worker failed: {}", e)))??;

    let world_name = read_identity(dest).await?;

    tracing::info!(
        "Extracted world package '{}' ({} files)",
        world_name,
        files_extracted
    );

    Ok(ExtractedPackage {
        root: dest.to_path_buf(),
        world_name,
        files_extracted,
    })
}

/// Decompress every entry of a zip stream below the existing directory `dest`,
/// preserving relative paths. Nothing above `dest` is ever created. `cancelled`
/// is polled before each entry.
pub fn extract_zip<R, C>(reader: R, dest: &Path, cancelled: C) -> Result<usize, WorldError>
where
    R: Read + Seek,
    C: Fn() -> bool,
{
    let mut archive = zip::ZipArchive::new(reader)
        .map_err(|e| WorldError::MalformedArchive(format!("not a valid zip archive: {}", e)))?;

    let mut count: usize = 0;
    for i in 0..archive.len() {
        if cancelled() {
            tracing::debug!("Extraction into {} cancelled after {} files", dest.display(), count);
            return Err(WorldError::Cancelled);
        }

        let mut entry = archive
            .by_index(i)
            .map_err(|e| WorldError::MalformedArchive(format!("failed to read entry {}: {}", i, e)))?;

        let entry_path = entry.enclosed_name().ok_or_else(|| {
            WorldError::MalformedArchive(format!("entry '{}' escapes the package root", entry.name()))
        })?;

        if entry.is_dir() {
            create_dirs_below(dest, &entry_path)?;
            continue;
        }

        if let Some(parent) = entry_path.parent() {
            create_dirs_below(dest, parent)?;
        }
        let output_path = dest.join(&entry_path);
        if let Ok(meta) = fs::symlink_metadata(&output_path) {
            if meta.is_dir() {
                return Err(conflicting_entry(&entry_path));
            }
        }
        let mut outfile =
            fs::File::create(&output_path).map_err(io_context("creating extracted file"))?;
        io::copy(&mut entry, &mut outfile).map_err(|e| {
            WorldError::MalformedArchive(format!(
                "failed to decompress '{}': {}",
                entry_path.display(),
                e
            ))
        })?;
        count += 1;
    }

    Ok(count)
}

/// Create each directory of `relative` below `root`, one level at a time.
/// A component that already exists as a file means the package contradicts itself.
fn create_dirs_below(root: &Path, relative: &Path) -> Result<(), WorldError> {
    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.is_dir() => continue,
            Ok(_) => return Err(conflicting_entry(relative)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(WorldError::filesystem("inspecting extracted directory", e)),
        }
        fs::create_dir(&current).map_err(io_context("creating extracted directory"))?;
    }
    Ok(())
}

fn conflicting_entry(path: &Path) -> WorldError {
    WorldError::MalformedArchive(format!(
        "entry '{}' conflicts with another entry of the package",
        path.display()
    ))
}

async fn read_identity(root: &Path) -> Result<String, WorldError> {
    let identity_path = root.join(IDENTITY_FILE);

    match path_kind(&identity_path)
        .await
        .map_err(io_context("inspecting identity file"))?
    {
        PathKind::File => {}
        PathKind::Directory | PathKind::Absent => {
            return Err(WorldError::InvalidPackageFormat(format!(
                "{} is missing from the package root",
                IDENTITY_FILE
            )));
        }
    }

    let raw = tokio::fs::read(&identity_path)
        .await
        .map_err(io_context("reading identity file"))?;
    let name = String::from_utf8(raw).map_err(|_| {
        WorldError::InvalidPackageFormat(format!("{} is not valid UTF-8", IDENTITY_FILE))
    })?;
    // Editors on Windows like to prepend a byte order mark
    let name = name.trim_start_matches('\u{feff}').trim();

    if name.is_empty() {
        return Err(WorldError::InvalidPackageFormat(format!(
            "{} is empty",
            IDENTITY_FILE
        )));
    }

    validate_world_dir_name(name).map_err(WorldError::InvalidName)?;
    Ok(name.to_string())
}

async fn discard_partial(dest: &Path) {
    match tokio::fs::remove_dir_all(dest).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove partial extraction {}: {}", dest.display(), e),
    }
}

#[cfg(test)]
#[path = "tests/reader_tests.rs"]
mod tests;
