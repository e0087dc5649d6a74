use super::*;
use crate::docker::DockerError;
use async_trait::async_trait;
use std::sync::Mutex;
use tempfile::TempDir;

#[derive(Default)]
struct FakeRuntime {
    containers: Vec<ContainerInfo>,
    created: Mutex<Vec<CreateServerRequest>>,
}

#[async_trait]
impl ServerRuntime for FakeRuntime {
    async fn list_servers(&self) -> Result<Vec<ContainerInfo>, DockerError> {
        Ok(self.containers.clone())
    }

    async fn create_server(&self, request: &CreateServerRequest) -> Result<String, DockerError> {
        self.created.lock().unwrap().push(request.clone());
        Ok(format!("id-{}", request.name))
    }

    async fn start_server(&self, container_id: &str) -> Result<(), DockerError> {
        Err(DockerError::ContainerNotFound(container_id.to_string()))
    }

    async fn stop_server(&self, _container_id: &str) -> Result<(), DockerError> {
        Ok(())
    }
}

fn container(public_port: u16) -> ContainerInfo {
    ContainerInfo {
        id: "c1".to_string(),
        name: "survival".to_string(),
        status: ServerStatus::Running,
        image: "itzg/minecraft-bedrock-server".to_string(),
        ports: vec![PortMapping {
            private_port: 19132,
            public_port: Some(public_port),
        }],
        mounts: Vec::new(),
        created: None,
    }
}

#[tokio::test]
async fn test_create_server_prepares_mount() {
    let dir = TempDir::new().unwrap();
    let storage = ServerStorage::new(dir.path().join("servers"));
    let runtime = FakeRuntime::default();
    let settings = DockerSettings::default();

    let response = create_server(&runtime, &storage, &settings, "survival".into(), None, None)
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.container_id.as_deref(), Some("id-survival"));
    assert_eq!(response.port, 19132);
    assert!(response.mount_path.join("worlds").is_dir());
    assert!(response.mount_path.join("behavior_packs").is_dir());

    let created = runtime.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].mount_path.as_ref(), Some(&response.mount_path));
}

#[tokio::test]
async fn test_create_server_requires_existing_world() {
    let dir = TempDir::new().unwrap();
    let storage = ServerStorage::new(dir.path().join("servers"));
    let runtime = FakeRuntime::default();
    let settings = DockerSettings::default();

    let result = create_server(
        &runtime,
        &storage,
        &settings,
        "survival".into(),
        None,
        Some("Missing".into()),
    )
    .await;

    assert!(result.is_err());
    assert!(runtime.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_server_loads_world() {
    let dir = TempDir::new().unwrap();
    let storage = ServerStorage::new(dir.path().join("servers"));
    let mount = storage.create_server_mount("survival").await.unwrap();
    std::fs::create_dir_all(mount.join("worlds/MyWorld")).unwrap();
    let runtime = FakeRuntime::default();

    let response = create_server(
        &runtime,
        &storage,
        &DockerSettings::default(),
        "survival".into(),
        Some(19140),
        Some("MyWorld".into()),
    )
    .await
    .unwrap();

    assert_eq!(response.world.as_deref(), Some("MyWorld"));
    let created = runtime.created.lock().unwrap();
    assert_eq!(created[0].world.as_deref(), Some("MyWorld"));
    assert_eq!(created[0].port, Some(19140));
}

#[tokio::test]
async fn test_create_server_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let storage = ServerStorage::new(dir.path().join("servers"));
    let runtime = FakeRuntime::default();
    let settings = DockerSettings::default();

    assert!(
        create_server(&runtime, &storage, &settings, "bad name".into(), None, None)
            .await
            .is_err()
    );
    assert!(
        create_server(&runtime, &storage, &settings, "ok".into(), Some(8080), None)
            .await
            .is_err()
    );
    assert!(!dir.path().join("servers").exists());
}

#[tokio::test]
async fn test_start_unknown_container_reports_error() {
    let runtime = FakeRuntime::default();

    let err = start_server(&runtime, "nope").await.unwrap_err();

    assert!(err.contains("nope"));
}

#[tokio::test]
async fn test_available_ports_excludes_used() {
    let runtime = FakeRuntime {
        containers: vec![container(19132), container(19133)],
        ..Default::default()
    };
    let settings = DockerSettings::default();

    let ports = get_available_ports(&runtime, &settings).await.unwrap();

    assert_eq!(ports.range_start, 19132);
    assert_eq!(ports.available.first(), Some(&19134));
    assert!(!ports.available.contains(&19133));
    assert_eq!(ports.available.len(), (19200 - 19132 - 2) as usize);
}
