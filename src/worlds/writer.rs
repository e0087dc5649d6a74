// Archive writer - packs a staging tree into a world package

use crate::worlds::error::WorldError;
use std::fs::File;
use std::io::{self, BufReader, Seek, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const COMPRESSION_LEVEL: i64 = 9;
const ZIP32_LIMIT: u64 = u32::MAX as u64;

#[derive(Debug, Clone, Copy, Default)]
pub struct PackageSummary {
    pub files: usize,
    pub directories: usize,
}

/// Write every file and directory under `staging_root` into `sink` as a zip,
/// with entry names relative to the root. Entries are emitted in sorted order.
pub fn write_package<W: Write + Seek>(
    staging_root: &Path,
    sink: W,
) -> Result<(W, PackageSummary), WorldError> {
    let mut zip = ZipWriter::new(sink);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));
    let mut summary = PackageSummary::default();

    for entry in WalkDir::new(staging_root).min_depth(1).sort_by_file_name() {
        let entry = entry
            .map_err(|e| WorldError::ArchiveWrite(format!("failed to walk staging tree: {}", e)))?;
        let relative = entry.path().strip_prefix(staging_root).map_err(|e| {
            WorldError::ArchiveWrite(format!("entry outside staging root: {}", e))
        })?;
        let name = entry_name(relative)?;

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)
                .map_err(|e| WorldError::ArchiveWrite(format!("failed to add '{}': {}", name, e)))?;
            summary.directories += 1;
        } else if entry.file_type().is_file() {
            let len = file_len(entry.path(), &name)?;
            zip.start_file(name.as_str(), options.large_file(len >= ZIP32_LIMIT))
                .map_err(|e| WorldError::ArchiveWrite(format!("failed to add '{}': {}", name, e)))?;

            let file = File::open(entry.path())
                .map_err(|e| WorldError::ArchiveWrite(format!("failed to open '{}': {}", name, e)))?;
            io::copy(&mut BufReader::new(file), &mut zip)
                .map_err(|e| WorldError::ArchiveWrite(format!("failed to compress '{}': {}", name, e)))?;
            summary.files += 1;
        } else {
            tracing::warn!("Skipping non-regular entry in package: {}", name);
        }
    }

    let sink = zip
        .finish()
        .map_err(|e| WorldError::ArchiveWrite(format!("failed to finalize archive: {}", e)))?;
    Ok((sink, summary))
}

/// Pack `staging_root` into a new file at `dest`, flushed to disk before returning
pub async fn write_package_file(
    staging_root: PathBuf,
    dest: PathBuf,
) -> Result<PackageSummary, WorldError> {
    tokio::task::spawn_blocking(move || {
        let file = File::create(&dest)
            .map_err(|e| WorldError::ArchiveWrite(format!("failed to create archive file: {}", e)))?;
        let (file, summary) = write_package(&staging_root, file)?;
        file.sync_all()
            .map_err(|e| WorldError::ArchiveWrite(format!("failed to flush archive file: {}", e)))?;
        Ok(summary)
    })
    .await
    .map_err(|e| WorldError::ArchiveWrite(format!("archive worker failed: {}", e)))?
}

/// Copy a finished package file into `out` and flush it. Returns bytes written.
pub async fn stream_package<W>(package: &Path, out: &mut W) -> Result<u64, WorldError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut file = tokio::fs::File::open(package)
        .await
        .map_err(|e| WorldError::ArchiveWrite(format!("failed to reopen archive: {}", e)))?;
    let written = tokio::io::copy(&mut file, out)
        .await
        .map_err(|e| WorldError::ArchiveWrite(format!("failed to stream archive: {}", e)))?;
    out.flush()
        .await
        .map_err(|e| WorldError::ArchiveWrite(format!("failed to flush archive stream: {}", e)))?;
    Ok(written)
}

// Decides the zip64 flag, so a failed stat cannot be read as zero
fn file_len(path: &Path, name: &str) -> Result<u64, WorldError> {
    std::fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|e| WorldError::ArchiveWrite(format!("failed to stat '{}': {}", name, e)))
}

/// Zip entry names always use '/' regardless of platform
fn entry_name(relative: &Path) -> Result<String, WorldError> {
    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            WorldError::ArchiveWrite(format!(
                "path is not valid UTF-8: {}",
                relative.to_string_lossy()
            ))
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
#[path = "tests/writer_tests.rs"]
mod tests;
