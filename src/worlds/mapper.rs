// Layout mapper - moves a world between package layout and server mount layout
//
// Package root:                      Server mount:
//   levelname.txt, level.dat, db/      worlds/<name>/levelname.txt, level.dat, db/
//   world_behavior_packs.json          worlds/<name>/world_behavior_packs.json
//   world_resource_packs.json          worlds/<name>/world_resource_packs.json
//   behavior_packs/                    behavior_packs/
//   resource_packs/                    resource_packs/

use crate::storage::{copy_dir_merge, path_kind, PathKind};
use crate::worlds::error::{io_context, WorldError};
use crate::worlds::layout::{EntryRole, PackKind, WORLDS_DIR};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    PackageToDisk,
    DiskToPackage,
}

/// What an import placed where
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub world_dir: PathBuf,
    pub files_copied: u64,
    pub manifests: Vec<String>,
    pub behavior_packs: Vec<String>,
    pub resource_packs: Vec<String>,
}

impl ImportReport {
    fn packs_mut(&mut self, kind: PackKind) -> &mut Vec<String> {
        match kind {
            PackKind::Behavior => &mut self.behavior_packs,
            PackKind::Resource => &mut self.resource_packs,
        }
    }
}

pub fn world_dir(server_mount: &Path, world_name: &str) -> PathBuf {
    server_mount.join(WORLDS_DIR).join(world_name)
}

/// Restructure between the two layouts. For `PackageToDisk`, `source` is an
/// extracted package root and `destination` a server mount; for `DiskToPackage`
/// it is the other way round.
pub async fn map_layout(
    direction: Direction,
    source: &Path,
    destination: &Path,
    world_name: &str,
) -> Result<(), WorldError> {
    match direction {
        Direction::PackageToDisk => import_into(source, destination, world_name)
            .await
            .map(|_| ()),
        Direction::DiskToPackage => export_from(source, world_name, destination).await,
    }
}

/// Place an extracted package into `server_mount`. Existing worlds of the same
/// name are merged over, not replaced. Nothing is rolled back on failure.
pub async fn import_into(
    extraction_root: &Path,
    server_mount: &Path,
    world_name: &str,
) -> Result<ImportReport, WorldError> {
    let target = world_dir(server_mount, world_name);
    tokio::fs::create_dir_all(&target)
        .await
        .map_err(io_context(format!("creating world directory '{}'", world_name)))?;

    let mut report = ImportReport {
        world_dir: target.clone(),
        ..Default::default()
    };
    let mut manifests = Vec::new();

    let mut entries = tokio::fs::read_dir(extraction_root)
        .await
        .map_err(io_context("reading extracted package"))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(io_context("reading extracted package"))?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        let source = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(io_context(format!("inspecting package entry '{}'", name)))?;

        match EntryRole::classify(&name) {
            EntryRole::AddonDir(kind) => {
                if !file_type.is_dir() {
                    tracing::warn!("Ignoring {} in package: not a directory", name);
                    continue;
                }
                let (names, copied) =
                    merge_packs(&source, &server_mount.join(kind.dir_name()), kind).await?;
                report.files_copied += copied;
                report.packs_mut(kind).extend(names);
            }
            EntryRole::Manifest(_) => manifests.push((name, source, file_type.is_dir())),
            EntryRole::SaveData => {
                report.files_copied += copy_entry(&source, &target.join(&name), file_type.is_dir())
                    .await
                    .map_err(io_context(format!("copying world data '{}'", name)))?;
            }
        }
    }

    // Manifests sit beside the save data on disk, never at the mount root
    for (name, source, is_dir) in manifests {
        report.files_copied += copy_entry(&source, &target.join(&name), is_dir)
            .await
            .map_err(io_context(format!("copying manifest '{}'", name)))?;
        report.manifests.push(name);
    }

    report.manifests.sort();
    report.behavior_packs.sort();
    report.resource_packs.sort();

    tracing::info!(
        "Imported world '{}' into {} ({} files, {} behavior packs, {} resource packs)",
        world_name,
        server_mount.display(),
        report.files_copied,
        report.behavior_packs.len(),
        report.resource_packs.len()
    );
    Ok(report)
}

/// Stage `worlds/<world_name>` plus the mount's pack directories as a package root
pub async fn export_from(
    server_mount: &Path,
    world_name: &str,
    staging_root: &Path,
) -> Result<(), WorldError> {
    let source = world_dir(server_mount, world_name);

    match path_kind(&source)
        .await
        .map_err(io_context(format!("inspecting world '{}'", world_name)))?
    {
        PathKind::Directory => {}
        PathKind::File | PathKind::Absent => {
            return Err(WorldError::WorldNotFound(world_name.to_string()));
        }
    }

    let mut copied = copy_dir_merge(&source, staging_root)
        .await
        .map_err(io_context(format!("staging world '{}'", world_name)))?;

    for kind in PackKind::ALL {
        let packs = server_mount.join(kind.dir_name());
        let found = path_kind(&packs)
            .await
            .map_err(io_context(format!("inspecting {}", kind.dir_name())))?;

        if found == PathKind::Directory {
            copied += copy_dir_merge(&packs, &staging_root.join(kind.dir_name()))
                .await
                .map_err(io_context(format!("staging {}", kind.dir_name())))?;
        }
    }

    tracing::info!(
        "Staged world '{}' for export ({} files)",
        world_name,
        copied
    );
    Ok(())
}

/// Merge one package pack directory into the mount's. Returns the pack names and file count.
async fn merge_packs(
    source: &Path,
    dest: &Path,
    kind: PackKind,
) -> Result<(Vec<String>, u64), WorldError> {
    let names = crate::storage::subdirectory_names(source)
        .await
        .map_err(io_context(format!("listing {} in package", kind.dir_name())))?;

    let copied = copy_dir_merge(source, dest)
        .await
        .map_err(io_context(format!("merging {}", kind.dir_name())))?;

    tracing::debug!("Merged {} {} packs into {}", names.len(), kind, dest.display());
    Ok((names, copied))
}

async fn copy_entry(source: &Path, dest: &Path, is_dir: bool) -> std::io::Result<u64> {
    if is_dir {
        copy_dir_merge(source, dest).await
    } else {
        tokio::fs::copy(source, dest).await?;
        Ok(1)
    }
}

#[cfg(test)]
#[path = "tests/mapper_tests.rs"]
mod tests;
