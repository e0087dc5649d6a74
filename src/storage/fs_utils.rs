// Filesystem primitives used by the layout mapper and mount queries

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// What a path currently points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Directory,
    File,
    Absent,
}

/// Probe a path without treating "missing" as an error. Symlinks are followed.
pub async fn path_kind(path: &Path) -> io::Result<PathKind> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(PathKind::Directory),
        Ok(_) => Ok(PathKind::File),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(PathKind::Absent),
        Err(e) => Err(e),
    }
}

/// Recursively copy `src` into `dest`, creating `dest` if needed.
/// Same-named files are overwritten; files only present in `dest` are left alone.
/// Returns the number of files copied.
pub async fn copy_dir_merge(src: &Path, dest: &Path) -> io::Result<u64> {
    let mut copied = 0u64;
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(src.to_path_buf(), dest.to_path_buf())];

    while let Some((from_dir, to_dir)) = pending.pop() {
        fs::create_dir_all(&to_dir).await?;

        let mut entries = fs::read_dir(&from_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let from = entry.path();
            let to = to_dir.join(entry.file_name());

            if file_type.is_dir() {
                pending.push((from, to));
            } else if file_type.is_file() {
                fs::copy(&from, &to).await?;
                copied += 1;
            } else {
                tracing::warn!("Skipping non-regular entry: {}", from.display());
            }
        }
    }

    Ok(copied)
}

/// Total size in bytes of every regular file below `path`
pub async fn dir_size(path: &Path) -> io::Result<u64> {
    let mut total = 0u64;
    let mut pending = vec![path.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if meta.is_dir() {
                pending.push(entry.path());
            } else {
                total += meta.len();
            }
        }
    }

    Ok(total)
}

/// Names of the immediate subdirectories of `path`, sorted. A missing directory yields none.
pub async fn subdirectory_names(path: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();

    let mut entries = match fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(names),
        Err(e) => return Err(e),
    };

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }

    names.sort();
    Ok(names)
}
