// Server commands - Bedrock server containers backed by server mounts

use crate::config::DockerSettings;
use crate::docker::{available_ports, ServerRuntime};
use crate::storage::ServerStorage;
use crate::validation::{validate_bedrock_port, validate_server_name};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortMapping {
    pub private_port: u16,
    pub public_port: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub status: ServerStatus,
    pub image: String,
    pub ports: Vec<PortMapping>,
    /// Host paths mounted into the container
    pub mounts: Vec<String>,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateServerRequest {
    pub name: String,
    pub port: Option<u16>,
    /// Server mount bound to the container data directory
    pub mount_path: Option<PathBuf>,
    /// World under `worlds/` the server should load
    pub world: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ServerResponse {
    pub success: bool,
    pub container_id: Option<String>,
    pub name: String,
    pub port: u16,
    pub mount_path: PathBuf,
    pub world: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PortsResponse {
    pub range_start: u16,
    pub range_end: u16,
    pub available: Vec<u16>,
}

pub async fn list_servers(runtime: &dyn ServerRuntime) -> Result<Vec<ContainerInfo>, String> {
    runtime.list_servers().await.map_err(|e| e.to_string())
}

/// Create the server mount (if needed) and a container serving it
pub async fn create_server(
    runtime: &dyn ServerRuntime,
    storage: &ServerStorage,
    settings: &DockerSettings,
    name: String,
    port: Option<u16>,
    world: Option<String>,
) -> Result<ServerResponse, String> {
    tracing::info!("Creating server: {}", name);

    validate_server_name(&name)?;
    let port = port.unwrap_or(settings.default_port);
    validate_bedrock_port(port)?;

    let mount_path = storage
        .create_server_mount(&name)
        .await
        .map_err(|e| e.user_message())?;

    if let Some(world) = &world {
        storage
            .world(&name, world)
            .await
            .map_err(|e| e.user_message())?;
    }

    let request = CreateServerRequest {
        name: name.clone(),
        port: Some(port),
        mount_path: Some(mount_path.clone()),
        world: world.clone(),
    };

    let container_id = runtime.create_server(&request).await.map_err(|e| {
        tracing::error!("Failed to create server {}: {}", name, e);
        e.to_string()
    })?;

    Ok(ServerResponse {
        success: true,
        container_id: Some(container_id),
        name,
        port,
        mount_path,
        world,
    })
}

pub async fn start_server(runtime: &dyn ServerRuntime, container_id: &str) -> Result<(), String> {
    tracing::info!("Starting server: {}", container_id);
    runtime
        .start_server(container_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn stop_server(runtime: &dyn ServerRuntime, container_id: &str) -> Result<(), String> {
    tracing::info!("Stopping server: {}", container_id);
    runtime
        .stop_server(container_id)
        .await
        .map_err(|e| e.to_string())
}

/// Host ports in the configured Bedrock range not published by any server
pub async fn get_available_ports(
    runtime: &dyn ServerRuntime,
    settings: &DockerSettings,
) -> Result<PortsResponse, String> {
    let containers = runtime.list_servers().await.map_err(|e| e.to_string())?;
    Ok(PortsResponse {
        range_start: settings.port_range_start,
        range_end: settings.port_range_end,
        available: available_ports(
            &containers,
            settings.port_range_start,
            settings.port_range_end,
        ),
    })
}

#[cfg(test)]
#[path = "tests/server_tests.rs"]
mod tests;
