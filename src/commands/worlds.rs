// World commands - list, import and export Bedrock worlds

use crate::storage::{path_kind, PathKind, WorldInfo};
use crate::worlds::{
    package_file_name, ExportOutcome, FailureCategory, ImportOutcome, WorldError, WorldService,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub world: Option<ImportOutcome>,
    pub category: Option<FailureCategory>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub success: bool,
    pub path: Option<PathBuf>,
    pub export: Option<ExportOutcome>,
    pub category: Option<FailureCategory>,
    pub error: Option<String>,
}

pub async fn list_worlds(service: &WorldService) -> Result<Vec<WorldInfo>, String> {
    service.list_worlds().await.map_err(|e| e.user_message())
}

/// Import the package at `file` into the server mount `server`
pub async fn import_world(
    service: &WorldService,
    server: &str,
    file: &Path,
) -> Result<ImportResponse, String> {
    let payload = tokio::fs::read(file)
        .await
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;

    match service.import_world(server, payload).await {
        Ok(outcome) => Ok(ImportResponse {
            success: true,
            world: Some(outcome),
            category: None,
            error: None,
        }),
        Err(e) => Ok(ImportResponse {
            success: false,
            world: None,
            category: Some(e.category()),
            error: Some(e.user_message()),
        }),
    }
}

/// Export a world to `output`. With `server` set, `world` is the world name
/// inside that mount; otherwise it is a `<mount>-<world>` id. A directory (or
/// no output at all) receives `<world>.mcworld`; any other path is used as the
/// file name.
pub async fn export_world(
    service: &WorldService,
    world: &str,
    server: Option<&str>,
    output: Option<&Path>,
) -> Result<ExportResponse, String> {
    let storage = service.storage();
    let found = match server {
        Some(label) => storage.world(label, world).await,
        None => storage.find_world(world).await,
    };
    let found = match found {
        Ok(found) => found,
        Err(e) => return Ok(export_failure(&e)),
    };

    let dest = destination(output, &package_file_name(&found.name)).await?;
    let mut file = tokio::fs::File::create(&dest)
        .await
        .map_err(|e| format!("Failed to create {}: {}", dest.display(), e))?;

    let result = service
        .export_mount_world(&found.server_mount, &found.name, &mut file)
        .await;
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            drop(file);
            if let Err(remove_err) = tokio::fs::remove_file(&dest).await {
                tracing::warn!(
                    "Failed to remove partial export {}: {}",
                    dest.display(),
                    remove_err
                );
            }
            return Ok(export_failure(&e));
        }
    };
    file.flush().await.map_err(|e| e.to_string())?;

    Ok(ExportResponse {
        success: true,
        path: Some(dest),
        export: Some(outcome),
        category: None,
        error: None,
    })
}

async fn destination(output: Option<&Path>, file_name: &str) -> Result<PathBuf, String> {
    let Some(output) = output else {
        return Ok(PathBuf::from(file_name));
    };
    match path_kind(output).await.map_err(|e| e.to_string())? {
        PathKind::Directory => Ok(output.join(file_name)),
        _ => Ok(output.to_path_buf()),
    }
}

fn export_failure(error: &WorldError) -> ExportResponse {
    ExportResponse {
        success: false,
        path: None,
        export: None,
        category: Some(error.category()),
        error: Some(error.user_message()),
    }
}

#[cfg(test)]
#[path = "tests/worlds_tests.rs"]
mod tests;
