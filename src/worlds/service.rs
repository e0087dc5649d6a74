// World service - import and export entry points
//
// Import: create mount -> extract into scratch -> map package onto the mount -> release scratch
// Export: map mount into scratch staging -> zip -> stream to caller -> release scratch

use crate::config::AppConfig;
use crate::storage::{world_id, ServerStorage, WorldInfo};
use crate::validation::validate_server_name;
use crate::worlds::error::WorldError;
use crate::worlds::layout::package_file_name;
use crate::worlds::scratch::ScratchSpace;
use crate::worlds::{mapper, reader, writer};
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::AsyncWrite;

const EXTRACT_DIR: &str = "package";
const STAGING_DIR: &str = "staging";

#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub world_id: String,
    /// Name from the package identity file, used for `worlds/<name>`
    pub world_name: String,
    pub server_mount: String,
    pub mount_path: PathBuf,
    pub files_copied: u64,
    pub manifests: Vec<String>,
    pub behavior_packs: Vec<String>,
    pub resource_packs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    pub world_id: String,
    pub world_name: String,
    pub file_name: String,
    pub bytes: u64,
    pub files: usize,
}

#[derive(Debug, Clone)]
pub struct WorldService {
    storage: ServerStorage,
    scratch: ScratchSpace,
    max_upload_bytes: u64,
}

impl WorldService {
    pub fn new(storage: ServerStorage, scratch: ScratchSpace, max_upload_bytes: u64) -> Self {
        Self {
            storage,
            scratch,
            max_upload_bytes,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ServerStorage::new(&config.servers_root),
            ScratchSpace::new(&config.scratch_root),
            config.max_upload_bytes,
        )
    }

    pub fn storage(&self) -> &ServerStorage {
        &self.storage
    }

    pub async fn list_worlds(&self) -> Result<Vec<WorldInfo>, WorldError> {
        self.storage.list_worlds().await
    }

    /// Import a world package into the server mount named `server_label`.
    /// The world directory name comes from the package, not from the label.
    pub async fn import_world(
        &self,
        server_label: &str,
        payload: Vec<u8>,
    ) -> Result<ImportOutcome, WorldError> {
        tracing::info!(
            "Importing world into {}: {} bytes",
            server_label,
            payload.len()
        );

        let result = self.import_inner(server_label, payload).await;
        match &result {
            Ok(outcome) => tracing::info!(
                "Imported world '{}' into server mount {}",
                outcome.world_name,
                outcome.server_mount
            ),
            Err(e) => tracing::error!("Failed to import world into {}: {}", server_label, e),
        }
        result
    }

    async fn import_inner(
        &self,
        server_label: &str,
        payload: Vec<u8>,
    ) -> Result<ImportOutcome, WorldError> {
        validate_server_name(server_label).map_err(WorldError::InvalidName)?;

        let size = payload.len() as u64;
        if size > self.max_upload_bytes {
            return Err(WorldError::PayloadTooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }
        if payload.is_empty() {
            return Err(WorldError::MalformedArchive("upload is empty".to_string()));
        }

        let mount_path = self.storage.create_server_mount(server_label).await?;

        self.scratch
            .scoped("import", |scratch| async move {
                let extracted = reader::extract_package(
                    payload,
                    &scratch.join(EXTRACT_DIR),
                    scratch.worker(),
                )
                .await?;
                let report =
                    mapper::import_into(&extracted.root, &mount_path, &extracted.world_name).await?;

                Ok::<_, WorldError>(ImportOutcome {
                    world_id: world_id(server_label, &extracted.world_name),
                    world_name: extracted.world_name,
                    server_mount: server_label.to_string(),
                    mount_path,
                    files_copied: report.files_copied,
                    manifests: report.manifests,
                    behavior_packs: report.behavior_packs,
                    resource_packs: report.resource_packs,
                })
            })
            .await
    }

    /// Export the world with id `<mount>-<world>` as a package written to `out`.
    /// `out` is flushed before this returns; on error it may hold a partial archive.
    pub async fn export_world<W>(&self, id: &str, out: &mut W) -> Result<ExportOutcome, WorldError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        tracing::info!("Exporting world: {}", id);

        let result = match self.storage.find_world(id).await {
            Ok(world) => self.export_inner(world, out).await,
            Err(e) => Err(e),
        };
        log_export(id, &result);
        result
    }

    /// Export world `world_name` of server mount `server_label`. Unlike the
    /// combined id this cannot be ambiguous.
    pub async fn export_mount_world<W>(
        &self,
        server_label: &str,
        world_name: &str,
        out: &mut W,
    ) -> Result<ExportOutcome, WorldError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        tracing::info!("Exporting world '{}' of {}", world_name, server_label);

        let result = match self.storage.world(server_label, world_name).await {
            Ok(world) => self.export_inner(world, out).await,
            Err(e) => Err(e),
        };
        log_export(&world_id(server_label, world_name), &result);
        result
    }

    async fn export_inner<W>(&self, world: WorldInfo, out: &mut W) -> Result<ExportOutcome, WorldError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mount_path = self.storage.mount_path(&world.server_mount);
        let file_name = package_file_name(&world.name);

        self.scratch
            .scoped("export", |scratch| async move {
                let staging = scratch.join(STAGING_DIR);
                mapper::export_from(&mount_path, &world.name, &staging).await?;

                let archive_path = scratch.join(&file_name);
                let summary = writer::write_package_file(staging, archive_path.clone()).await?;
                let bytes = writer::stream_package(&archive_path, out).await?;

                Ok::<_, WorldError>(ExportOutcome {
                    world_id: world.id,
                    world_name: world.name,
                    file_name,
                    bytes,
                    files: summary.files,
                })
            })
            .await
    }
}

fn log_export(id: &str, result: &Result<ExportOutcome, WorldError>) {
    match result {
        Ok(outcome) => tracing::info!(
            "Exported world '{}' as {} ({} bytes)",
            outcome.world_name,
            outcome.file_name,
            outcome.bytes
        ),
        Err(e) => tracing::error!("Failed to export world {}: {}", id, e),
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
