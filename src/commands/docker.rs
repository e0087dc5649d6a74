// Docker-related commands

use crate::config::AppConfig;
use crate::docker::DockerManager;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DockerStatus {
    pub available: bool,
    pub running: bool,
    pub image: String,
    /// `None` when the daemon could not be asked
    pub image_present: Option<bool>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DockerInfo {
    pub version: String,
    pub api_version: String,
    pub os: String,
    pub arch: String,
    pub containers_running: u64,
    pub containers_total: u64,
    pub images: u64,
}

/// Connect to the local Docker daemon with the configured server settings
pub async fn connect(config: &AppConfig) -> Result<DockerManager, String> {
    DockerManager::new(config.docker.clone(), config.server_defaults.clone())
        .await
        .map_err(|e| e.to_string())
}

/// Check if Docker is available and running, and whether the server image is pulled
pub async fn check_docker_status(config: &AppConfig) -> Result<DockerStatus, String> {
    let image = config.docker.image.clone();

    let docker = match connect(config).await {
        Ok(docker) => docker,
        Err(e) => {
            return Ok(DockerStatus {
                available: false,
                running: false,
                image,
                image_present: None,
                error: Some(format!("Docker not available: {}", e)),
            })
        }
    };

    if let Err(e) = docker.ping().await {
        return Ok(DockerStatus {
            available: true,
            running: false,
            image,
            image_present: None,
            error: Some(format!("Docker not responding: {}", e)),
        });
    }

    match docker.has_server_image().await {
        Ok(present) => Ok(DockerStatus {
            available: true,
            running: true,
            image,
            image_present: Some(present),
            error: None,
        }),
        Err(e) => {
            tracing::warn!("Failed to inspect image {}: {}", image, e);
            Ok(DockerStatus {
                available: true,
                running: true,
                image,
                image_present: None,
                error: Some(format!("Image inspection failed: {}", e)),
            })
        }
    }
}

/// Get Docker system information
pub async fn get_docker_info(config: &AppConfig) -> Result<DockerInfo, String> {
    let docker = connect(config).await?;
    docker.get_info().await.map_err(|e| e.to_string())
}
