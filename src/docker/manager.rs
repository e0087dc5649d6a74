// Docker Manager - Handles all Docker operations for Bedrock server containers

use crate::commands::docker::DockerInfo;
use crate::commands::server::{ContainerInfo, CreateServerRequest, PortMapping, ServerStatus};
use crate::config::{DockerSettings, ServerDefaults};
use crate::docker::ServerRuntime;
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{
    ContainerSummary, HostConfig, PortBinding, RestartPolicy, RestartPolicyNameEnum,
};
use bollard::Docker;
use futures_util::stream::StreamExt;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Path the server image keeps its data under
const CONTAINER_DATA_PATH: &str = "/data";

#[derive(Error, Debug)]
pub enum DockerError {
    #[error("Docker connection error: {0}")]
    ConnectionError(#[from] bollard::errors::Error),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Image pull failed: {0}")]
    ImagePullFailed(String),
}

pub struct DockerManager {
    docker: Docker,
    settings: DockerSettings,
    defaults: ServerDefaults,
}

impl DockerManager {
    /// Create a new Docker manager instance
    pub async fn new(
        settings: DockerSettings,
        defaults: ServerDefaults,
    ) -> Result<Self, DockerError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self {
            docker,
            settings,
            defaults,
        })
    }

    /// Ping Docker to check if it's running
    pub async fn ping(&self) -> Result<(), DockerError> {
        self.docker.ping().await?;
        Ok(())
    }

    /// Get Docker system information
    pub async fn get_info(&self) -> Result<DockerInfo, DockerError> {
        let info = self.docker.info().await?;
        let version = self.docker.version().await?;

        Ok(DockerInfo {
            version: version.version.unwrap_or_default(),
            api_version: version.api_version.unwrap_or_default(),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
            containers_running: info.containers_running.unwrap_or(0) as u64,
            containers_total: info.containers.unwrap_or(0) as u64,
            images: info.images.unwrap_or(0) as u64,
        })
    }

    /// Whether the configured server image is already available locally
    pub async fn has_server_image(&self) -> Result<bool, DockerError> {
        match self.docker.inspect_image(&self.settings.image).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Pull a Docker image
    pub async fn pull_image(&self, image: &str) -> Result<(), DockerError> {
        tracing::info!("Pulling image: {}", image);
        let options = Some(CreateImageOptions {
            from_image: image,
            ..Default::default()
        });

        let mut stream = self.docker.create_image(options, None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = info.status {
                        tracing::debug!("Pulling {}: {}", image, status);
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to pull image {}: {}", image, e);
                    return Err(DockerError::ImagePullFailed(e.to_string()));
                }
            }
        }

        tracing::info!("Successfully pulled image: {}", image);
        Ok(())
    }

    /// Remove a container
    pub async fn remove_container(&self, container_id: &str) -> Result<(), DockerError> {
        tracing::info!("Removing container: {}", container_id);
        let options = Some(RemoveContainerOptions {
            force: true,
            v: false,
            ..Default::default()
        });
        self.docker.remove_container(container_id, options).await?;
        Ok(())
    }
}

#[async_trait]
impl ServerRuntime for DockerManager {
    async fn list_servers(&self) -> Result<Vec<ContainerInfo>, DockerError> {
        let options = Some(ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        });

        let containers = self.docker.list_containers(options).await?;
        Ok(containers
            .into_iter()
            .filter(|c| is_bedrock_container(&self.settings, c))
            .map(|c| container_info(&self.settings, c))
            .collect())
    }

    async fn create_server(&self, request: &CreateServerRequest) -> Result<String, DockerError> {
        self.pull_image(&self.settings.image).await?;

        let host_port = request.port.unwrap_or(self.settings.default_port);
        let config = container_config(&self.settings, &self.defaults, request, host_port);

        let container_name = format!("{}{}", self.settings.container_prefix, request.name);
        let options = Some(CreateContainerOptions {
            name: container_name.as_str(),
            platform: None,
        });

        tracing::info!("Creating container: {}", container_name);
        let response = self.docker.create_container(options, config).await?;
        tracing::info!("Container created with ID: {}", response.id);

        // A container that never started would hold the name and port
        if let Err(e) = self.start_server(&response.id).await {
            tracing::error!("Failed to start new container {}: {}", container_name, e);
            if let Err(remove_err) = self.remove_container(&response.id).await {
                tracing::warn!(
                    "Failed to remove container {}: {}",
                    container_name,
                    remove_err
                );
            }
            return Err(e);
        }
        Ok(response.id)
    }

    async fn start_server(&self, container_id: &str) -> Result<(), DockerError> {
        tracing::info!("Starting container: {}", container_id);
        self.docker
            .start_container(container_id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| not_found_or(container_id, e))?;
        Ok(())
    }

    async fn stop_server(&self, container_id: &str) -> Result<(), DockerError> {
        tracing::info!("Stopping container: {}", container_id);
        let options = Some(StopContainerOptions { t: 30 });
        self.docker
            .stop_container(container_id, options)
            .await
            .map_err(|e| not_found_or(container_id, e))?;
        Ok(())
    }
}

/// Build the create options for a Bedrock server container
pub fn container_config(
    settings: &DockerSettings,
    defaults: &ServerDefaults,
    request: &CreateServerRequest,
    host_port: u16,
) -> Config<String> {
    let mut env_vars = vec![
        "EULA=TRUE".to_string(),
        format!("SERVER_NAME={}", request.name),
        format!("GAMEMODE={}", defaults.gamemode),
        format!("DIFFICULTY={}", defaults.difficulty),
        format!("MAX_PLAYERS={}", defaults.max_players),
    ];

    let container_port = format!("{}/udp", settings.default_port);
    let mut port_bindings = HashMap::new();
    port_bindings.insert(
        container_port.clone(),
        Some(vec![PortBinding {
            host_ip: Some("0.0.0.0".to_string()),
            host_port: Some(host_port.to_string()),
        }]),
    );
    let mut exposed_ports = HashMap::new();
    exposed_ports.insert(container_port, HashMap::new());

    // Mount the server directory so worlds/ and the pack directories line up with the image
    let binds = request.mount_path.as_ref().map(|mount| {
        let mount_str = mount.to_string_lossy().replace('\\', "/");
        let bind = format!("{}:{}", mount_str, CONTAINER_DATA_PATH);
        tracing::info!("Volume mount: {}", bind);
        vec![bind]
    });
    if let Some(world) = &request.world {
        env_vars.push(format!("LEVEL_NAME={}", world));
    }

    let host_config = HostConfig {
        port_bindings: Some(port_bindings),
        binds,
        restart_policy: Some(RestartPolicy {
            name: Some(restart_policy_name(&settings.restart_policy)),
            ..Default::default()
        }),
        ..Default::default()
    };

    Config {
        image: Some(settings.image.clone()),
        env: Some(env_vars),
        exposed_ports: Some(exposed_ports),
        host_config: Some(host_config),
        tty: Some(true),
        open_stdin: Some(true),
        ..Default::default()
    }
}

fn is_bedrock_container(settings: &DockerSettings, summary: &ContainerSummary) -> bool {
    let image_matches = summary
        .image
        .as_deref()
        .map(|image| image.contains(&settings.image))
        .unwrap_or(false);
    let name_matches = summary
        .names
        .as_ref()
        .map(|names| names.iter().any(|n| n.contains(&settings.container_prefix)))
        .unwrap_or(false);
    image_matches || name_matches
}

fn container_info(settings: &DockerSettings, summary: ContainerSummary) -> ContainerInfo {
    let prefixed = format!("/{}", settings.container_prefix);
    let name = summary
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|n| {
            n.strip_prefix(prefixed.as_str())
                .or_else(|| n.strip_prefix('/'))
                .unwrap_or(n.as_str())
                .to_string()
        })
        .unwrap_or_else(|| "unknown".to_string());

    ContainerInfo {
        id: summary.id.unwrap_or_default(),
        name,
        status: container_status(summary.state.as_deref().unwrap_or_default()),
        image: summary.image.unwrap_or_else(|| "unknown".to_string()),
        ports: summary
            .ports
            .unwrap_or_default()
            .into_iter()
            .map(|p| PortMapping {
                private_port: p.private_port,
                public_port: p.public_port,
            })
            .collect(),
        mounts: summary
            .mounts
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.source)
            .collect(),
        created: summary
            .created
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0)),
    }
}

fn not_found_or(container_id: &str, error: bollard::errors::Error) -> DockerError {
    match error {
        bollard::errors::Error::DockerResponseServerError { status_code: 404, .. } => {
            DockerError::ContainerNotFound(container_id.to_string())
        }
        other => DockerError::ConnectionError(other),
    }
}

/// Map a container state string from the listing API
pub fn container_status(state: &str) -> ServerStatus {
    match state {
        "running" => ServerStatus::Running,
        "created" | "restarting" => ServerStatus::Starting,
        "removing" => ServerStatus::Stopping,
        _ => ServerStatus::Stopped,
    }
}

fn restart_policy_name(policy: &str) -> RestartPolicyNameEnum {
    match policy {
        "always" => RestartPolicyNameEnum::ALWAYS,
        "on-failure" => RestartPolicyNameEnum::ON_FAILURE,
        "no" => RestartPolicyNameEnum::NO,
        _ => RestartPolicyNameEnum::UNLESS_STOPPED,
    }
}

/// Ports in `start..end` that no listed container publishes
pub fn available_ports(containers: &[ContainerInfo], start: u16, end: u16) -> Vec<u16> {
    let used: HashSet<u16> = containers
        .iter()
        .flat_map(|c| c.ports.iter().filter_map(|p| p.public_port))
        .collect();

    (start..end).filter(|port| !used.contains(port)).collect()
}

#[cfg(test)]
#[path = "tests/manager_tests.rs"]
mod tests;
