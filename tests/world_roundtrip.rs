use bedrock_world_manager::storage::ServerStorage;
use bedrock_world_manager::worlds::{FailureCategory, ScratchSpace, WorldError, WorldService};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in files {
        writer.start_file(name.to_string(), options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn scenario_a() -> Vec<u8> {
    build_zip(&[
        ("levelname.txt", b"MyWorld"),
        ("level.dat", b"\x0a\x00\x00level"),
        ("db/CURRENT", b"MANIFEST-000002"),
        ("db/000003.log", &[7u8; 4096]),
        ("world_behavior_packs.json", br#"[{"pack_id":"a","version":[1,0,0]}]"#),
        ("behavior_packs/AddonA/manifest.json", br#"{"format_version":2}"#),
        ("behavior_packs/AddonA/scripts/main.js", b"// main"),
    ])
}

fn service(dir: &Path) -> WorldService {
    WorldService::new(
        ServerStorage::new(dir.join("servers")),
        ScratchSpace::new(dir.join("scratch")),
        64 * 1024 * 1024,
    )
}

/// Relative path -> content for every regular file under `root`
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (key, std::fs::read(e.path()).unwrap())
        })
        .collect()
}

/// File name -> content for every file entry of a package
fn package_files(bytes: &[u8]) -> BTreeMap<String, Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut files = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        if entry.is_dir() {
            continue;
        }
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        files.insert(entry.name().to_string(), content);
    }
    files
}

fn scratch_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir.join("scratch"))
        .map(|mut d| d.next().is_none())
        .unwrap_or(true)
}

#[tokio::test]
async fn scenario_a_relocates_manifests_and_addons() {
    let dir = TempDir::new().unwrap();
    let service = service(dir.path());

    service.import_world("srv1", scenario_a()).await.unwrap();

    let mount = dir.path().join("servers/srv1");
    assert!(mount.join("worlds/MyWorld/levelname.txt").is_file());
    assert!(mount.join("worlds/MyWorld/world_behavior_packs.json").is_file());
    assert!(mount.join("behavior_packs/AddonA").is_dir());
    assert!(!mount.join("worlds/MyWorld/behavior_packs").exists());
    assert!(!mount.join("world_behavior_packs.json").exists());
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn scenario_b_export_restores_package_layout() {
    let dir = TempDir::new().unwrap();
    let service = service(dir.path());
    service.import_world("srv1", scenario_a()).await.unwrap();

    let mut out = Vec::new();
    service.export_world("srv1-MyWorld", &mut out).await.unwrap();

    let archive = zip::ZipArchive::new(Cursor::new(out)).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"levelname.txt"));
    assert!(names.contains(&"world_behavior_packs.json"));
    assert!(names.iter().any(|n| n.starts_with("behavior_packs/AddonA/")));
    assert!(names.iter().all(|n| !n.split('/').any(|seg| seg == "worlds")));
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn scenario_c_empty_upload_is_malformed() {
    let dir = TempDir::new().unwrap();
    let service = service(dir.path());

    let err = service.import_world("srv1", Vec::new()).await.unwrap_err();

    assert!(matches!(err, WorldError::MalformedArchive(_)));
    assert_eq!(err.category(), FailureCategory::BadPackage);
    assert!(service.list_worlds().await.unwrap().is_empty());
}

#[tokio::test]
async fn round_trip_preserves_files() {
    let dir = TempDir::new().unwrap();
    let service = service(dir.path());
    let package = scenario_a();
    service.import_world("srv1", package.clone()).await.unwrap();

    let mut out = Vec::new();
    service.export_world("srv1-MyWorld", &mut out).await.unwrap();

    assert_eq!(package_files(&out), package_files(&package));
}

#[tokio::test]
async fn reimport_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let service = service(dir.path());
    let mount = dir.path().join("servers/srv1");

    service.import_world("srv1", scenario_a()).await.unwrap();
    let once = snapshot(&mount);
    service.import_world("srv1", scenario_a()).await.unwrap();
    let twice = snapshot(&mount);

    assert_eq!(once, twice);
    assert_eq!(service.list_worlds().await.unwrap().len(), 1);
}

#[tokio::test]
async fn failures_leave_no_scratch() {
    let dir = TempDir::new().unwrap();
    let service = service(dir.path());

    let corrupt = b"PK\x03\x04 definitely not a zip".to_vec();
    assert!(service.import_world("srv1", corrupt).await.is_err());

    let no_identity = build_zip(&[("level.dat", b"dat")]);
    let err = service.import_world("srv1", no_identity).await.unwrap_err();
    assert!(matches!(err, WorldError::InvalidPackageFormat(_)));

    let escaping = build_zip(&[("levelname.txt", b"MyWorld"), ("../evil.txt", b"x")]);
    let err = service.import_world("srv1", escaping).await.unwrap_err();
    assert!(matches!(err, WorldError::MalformedArchive(_)));
    assert!(!dir.path().join("evil.txt").exists());

    let mut out = Vec::new();
    assert!(service.export_world("srv1-Missing", &mut out).await.is_err());

    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn resource_packs_follow_the_same_rules() {
    let dir = TempDir::new().unwrap();
    let service = service(dir.path());
    let package = build_zip(&[
        ("levelname.txt", b"Skyblock"),
        ("world_resource_packs.json", b"[]"),
        ("resource_packs/TexturesB/manifest.json", b"{}"),
    ]);

    let outcome = service.import_world("srv2", package).await.unwrap();

    let mount = dir.path().join("servers/srv2");
    assert_eq!(outcome.resource_packs, vec!["TexturesB"]);
    assert!(mount.join("resource_packs/TexturesB/manifest.json").is_file());
    assert!(mount.join("worlds/Skyblock/world_resource_packs.json").is_file());
    assert!(!mount.join("worlds/Skyblock/resource_packs").exists());

    let world = service.storage().world("srv2", "Skyblock").await.unwrap();
    assert!(world.addons.iter().any(|a| a.name == "TexturesB"));
}
