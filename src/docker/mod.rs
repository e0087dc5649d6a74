mod manager;

pub use manager::{
    available_ports, container_config, container_status, DockerError, DockerManager,
};

use crate::commands::server::{ContainerInfo, CreateServerRequest};
use async_trait::async_trait;

/// Container runtime that hosts the dedicated servers
#[async_trait]
pub trait ServerRuntime: Send + Sync {
    async fn list_servers(&self) -> Result<Vec<ContainerInfo>, DockerError>;

    /// Create and start a server container, returning its id
    async fn create_server(&self, request: &CreateServerRequest) -> Result<String, DockerError>;

    async fn start_server(&self, container_id: &str) -> Result<(), DockerError>;

    async fn stop_server(&self, container_id: &str) -> Result<(), DockerError>;
}
