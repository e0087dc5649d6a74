// Server mount storage - directory scaffolding and world discovery

mod fs_utils;

pub use fs_utils::{copy_dir_merge, dir_size, path_kind, subdirectory_names, PathKind};

use crate::validation::validate_server_name;
use crate::worlds::error::io_context;
use crate::worlds::{PackKind, WorldError, WORLDS_DIR};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct AddonInfo {
    pub name: String,
    pub kind: PackKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldInfo {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub server_mount: String,
    pub addons: Vec<AddonInfo>,
    pub size_bytes: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Identifier used by the export boundary to address a world
pub fn world_id(server_mount: &str, world_name: &str) -> String {
    format!("{}-{}", server_mount, world_name)
}

#[derive(Debug, Clone)]
pub struct ServerStorage {
    servers_root: PathBuf,
}

impl ServerStorage {
    pub fn new(servers_root: impl Into<PathBuf>) -> Self {
        Self {
            servers_root: servers_root.into(),
        }
    }

    pub fn servers_root(&self) -> &Path {
        &self.servers_root
    }

    pub fn mount_path(&self, label: &str) -> PathBuf {
        self.servers_root.join(label)
    }

    /// Create `<root>/<label>/{worlds,behavior_packs,resource_packs}`. Existing directories are kept.
    pub async fn create_server_mount(&self, label: &str) -> Result<PathBuf, WorldError> {
        validate_server_name(label).map_err(WorldError::InvalidName)?;

        let mount = self.mount_path(label);
        tokio::fs::create_dir_all(mount.join(WORLDS_DIR))
            .await
            .map_err(io_context(format!("creating server mount '{}'", label)))?;

        for kind in PackKind::ALL {
            tokio::fs::create_dir_all(mount.join(kind.dir_name()))
                .await
                .map_err(io_context(format!(
                    "creating {} for server mount '{}'",
                    kind.dir_name(),
                    label
                )))?;
        }

        tracing::info!("Server mount ready: {}", mount.display());
        Ok(mount)
    }

    pub async fn delete_server_mount(&self, label: &str) -> Result<(), WorldError> {
        validate_server_name(label).map_err(WorldError::InvalidName)?;

        let mount = self.mount_path(label);
        match tokio::fs::remove_dir_all(&mount).await {
            Ok(()) => {
                tracing::info!("Deleted server mount: {}", mount.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WorldError::filesystem(
                format!("deleting server mount '{}'", label),
                e,
            )),
        }
    }

    pub async fn server_mount_exists(&self, label: &str) -> Result<bool, WorldError> {
        let kind = path_kind(&self.mount_path(label))
            .await
            .map_err(io_context(format!("inspecting server mount '{}'", label)))?;
        Ok(kind == PathKind::Directory)
    }

    pub async fn list_server_mounts(&self) -> Result<Vec<String>, WorldError> {
        subdirectory_names(&self.servers_root)
            .await
            .map_err(io_context("listing server mounts"))
    }

    /// Pack directories at the server mount root
    pub async fn addons_in_mount(&self, label: &str) -> Result<Vec<AddonInfo>, WorldError> {
        let mount = self.mount_path(label);
        let mut addons = Vec::new();

        for kind in PackKind::ALL {
            let packs_dir = mount.join(kind.dir_name());
            let names = subdirectory_names(&packs_dir)
                .await
                .map_err(io_context(format!("listing {} of '{}'", kind.dir_name(), label)))?;

            addons.extend(names.into_iter().map(|name| AddonInfo {
                path: packs_dir.join(&name),
                name,
                kind,
            }));
        }

        Ok(addons)
    }

    pub async fn worlds_in_mount(&self, label: &str) -> Result<Vec<WorldInfo>, WorldError> {
        let worlds_dir = self.mount_path(label).join(WORLDS_DIR);
        let names = subdirectory_names(&worlds_dir)
            .await
            .map_err(io_context(format!("listing worlds of '{}'", label)))?;

        if names.is_empty() {
            return Ok(Vec::new());
        }

        let addons = self.addons_in_mount(label).await?;
        let mut worlds = Vec::with_capacity(names.len());

        for name in names {
            let path = worlds_dir.join(&name);
            let size_bytes = dir_size(&path)
                .await
                .map_err(io_context(format!("measuring world '{}'", name)))?;
            let last_modified = tokio::fs::metadata(&path)
                .await
                .ok()
                .and_then(|meta| meta.modified().ok())
                .map(DateTime::<Utc>::from);

            worlds.push(WorldInfo {
                id: world_id(label, &name),
                name,
                path,
                server_mount: label.to_string(),
                addons: addons.clone(),
                size_bytes,
                last_modified,
            });
        }

        Ok(worlds)
    }

    /// Every world across every server mount. A mount that cannot be read is
    /// logged and skipped so one broken directory does not hide the rest.
    pub async fn list_worlds(&self) -> Result<Vec<WorldInfo>, WorldError> {
        let mut worlds = Vec::new();

        for mount in self.list_server_mounts().await? {
            match self.worlds_in_mount(&mount).await {
                Ok(found) => worlds.extend(found),
                Err(e) => tracing::warn!("Failed to read worlds from {}: {}", mount, e),
            }
        }

        Ok(worlds)
    }

    /// Resolve a `<mount>-<world>` id. Mount labels and world names may both
    /// contain `-`, so one id can name several worlds; that is an error rather
    /// than a guess.
    pub async fn find_world(&self, id: &str) -> Result<WorldInfo, WorldError> {
        let mut matches: Vec<WorldInfo> = self
            .list_worlds()
            .await?
            .into_iter()
            .filter(|world| world.id == id)
            .collect();

        match matches.len() {
            0 => Err(WorldError::WorldNotFound(id.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(WorldError::AmbiguousWorld {
                id: id.to_string(),
                candidates: matches
                    .iter()
                    .map(|world| format!("{}/{}", world.server_mount, world.name))
                    .collect(),
            }),
        }
    }

    pub async fn world(&self, label: &str, world_name: &str) -> Result<WorldInfo, WorldError> {
        self.worlds_in_mount(label)
            .await?
            .into_iter()
            .find(|world| world.name == world_name)
            .ok_or_else(|| WorldError::WorldNotFound(world_id(label, world_name)))
    }
}

#[cfg(test)]
#[path = "tests/storage_tests.rs"]
mod tests;
