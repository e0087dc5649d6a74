use super::*;
use std::fs;
use tempfile::TempDir;

/// Helper: an extracted package root with save data, manifests and both pack dirs
fn extracted_package(root: &Path) {
    fs::create_dir_all(root.join("db")).unwrap();
    fs::create_dir_all(root.join("behavior_packs/AddonA/scripts")).unwrap();
    fs::create_dir_all(root.join("resource_packs/TexturesB")).unwrap();
    fs::write(root.join("levelname.txt"), b"MyWorld").unwrap();
    fs::write(root.join("level.dat"), b"\x0a\x00level").unwrap();
    fs::write(root.join("db/000005.ldb"), b"chunks").unwrap();
    fs::write(root.join("world_behavior_packs.json"), b"[{\"pack_id\":\"a\"}]").unwrap();
    fs::write(root.join("world_resource_packs.json"), b"[]").unwrap();
    fs::write(root.join("behavior_packs/AddonA/manifest.json"), b"{}").unwrap();
    fs::write(root.join("behavior_packs/AddonA/scripts/main.js"), b"run()").unwrap();
    fs::write(root.join("resource_packs/TexturesB/manifest.json"), b"{}").unwrap();
}

#[tokio::test]
async fn test_import_relocates_manifests_and_packs() {
    let dir = TempDir::new().unwrap();
    let package = dir.path().join("package");
    let mount = dir.path().join("srv1");
    extracted_package(&package);

    let report = import_into(&package, &mount, "MyWorld").await.unwrap();
    let world = mount.join("worlds/MyWorld");

    assert_eq!(report.world_dir, world);
    assert_eq!(report.behavior_packs, vec!["AddonA"]);
    assert_eq!(report.resource_packs, vec!["TexturesB"]);
    assert_eq!(
        report.manifests,
        vec!["world_behavior_packs.json", "world_resource_packs.json"]
    );
    assert_eq!(report.files_copied, 8);

    assert_eq!(fs::read(world.join("levelname.txt")).unwrap(), b"MyWorld");
    assert_eq!(fs::read(world.join("level.dat")).unwrap(), b"\x0a\x00level");
    assert_eq!(fs::read(world.join("db/000005.ldb")).unwrap(), b"chunks");
    assert!(world.join("world_behavior_packs.json").is_file());
    assert!(world.join("world_resource_packs.json").is_file());
    assert!(!mount.join("world_behavior_packs.json").exists());
    assert!(!mount.join("world_resource_packs.json").exists());

    assert!(mount.join("behavior_packs/AddonA/scripts/main.js").is_file());
    assert!(mount.join("resource_packs/TexturesB/manifest.json").is_file());
    assert!(!world.join("behavior_packs").exists());
    assert!(!world.join("resource_packs").exists());
}

#[tokio::test]
async fn test_import_merges_into_existing_packs_and_world() {
    let dir = TempDir::new().unwrap();
    let package = dir.path().join("package");
    let mount = dir.path().join("srv1");
    extracted_package(&package);

    fs::create_dir_all(mount.join("behavior_packs/OtherAddon")).unwrap();
    fs::write(mount.join("behavior_packs/OtherAddon/manifest.json"), b"other").unwrap();
    fs::create_dir_all(mount.join("worlds/MyWorld")).unwrap();
    fs::write(mount.join("worlds/MyWorld/level.dat"), b"stale").unwrap();
    fs::write(mount.join("worlds/MyWorld/players.dat"), b"kept").unwrap();

    import_into(&package, &mount, "MyWorld").await.unwrap();

    assert_eq!(
        fs::read(mount.join("behavior_packs/OtherAddon/manifest.json")).unwrap(),
        b"other"
    );
    assert!(mount.join("behavior_packs/AddonA/manifest.json").is_file());
    assert_eq!(
        fs::read(mount.join("worlds/MyWorld/level.dat")).unwrap(),
        b"\x0a\x00level"
    );
    assert_eq!(
        fs::read(mount.join("worlds/MyWorld/players.dat")).unwrap(),
        b"kept"
    );
}

#[tokio::test]
async fn test_import_without_packs_or_manifests() {
    let dir = TempDir::new().unwrap();
    let package = dir.path().join("package");
    let mount = dir.path().join("srv1");
    fs::create_dir_all(&package).unwrap();
    fs::write(package.join("levelname.txt"), b"Bare").unwrap();

    let report = import_into(&package, &mount, "Bare").await.unwrap();

    assert_eq!(report.files_copied, 1);
    assert!(report.manifests.is_empty());
    assert!(report.behavior_packs.is_empty());
    assert!(!mount.join("behavior_packs").exists());
    assert!(mount.join("worlds/Bare/levelname.txt").is_file());
}

#[tokio::test]
async fn test_import_ignores_pack_named_file() {
    let dir = TempDir::new().unwrap();
    let package = dir.path().join("package");
    let mount = dir.path().join("srv1");
    fs::create_dir_all(&package).unwrap();
    fs::write(package.join("levelname.txt"), b"Odd").unwrap();
    fs::write(package.join("behavior_packs"), b"not a dir").unwrap();

    import_into(&package, &mount, "Odd").await.unwrap();

    assert!(!mount.join("behavior_packs").exists());
    assert!(!mount.join("worlds/Odd/behavior_packs").exists());
}

#[tokio::test]
async fn test_import_fails_when_pack_destination_is_a_file() {
    let dir = TempDir::new().unwrap();
    let package = dir.path().join("package");
    let mount = dir.path().join("srv1");
    extracted_package(&package);
    fs::create_dir_all(&mount).unwrap();
    fs::write(mount.join("behavior_packs"), b"in the way").unwrap();

    let err = import_into(&package, &mount, "MyWorld").await.unwrap_err();
    assert!(matches!(err, WorldError::Filesystem { .. }));
}

#[tokio::test]
async fn test_export_stages_package_layout() {
    let dir = TempDir::new().unwrap();
    let package = dir.path().join("package");
    let mount = dir.path().join("srv1");
    let staging = dir.path().join("staging");
    extracted_package(&package);
    import_into(&package, &mount, "MyWorld").await.unwrap();

    export_from(&mount, "MyWorld", &staging).await.unwrap();

    assert_eq!(fs::read(staging.join("levelname.txt")).unwrap(), b"MyWorld");
    assert!(staging.join("world_behavior_packs.json").is_file());
    assert!(staging.join("world_resource_packs.json").is_file());
    assert!(staging.join("db/000005.ldb").is_file());
    assert_eq!(
        fs::read(staging.join("behavior_packs/AddonA/scripts/main.js")).unwrap(),
        b"run()"
    );
    assert!(staging.join("resource_packs/TexturesB/manifest.json").is_file());
    assert!(!staging.join("worlds").exists());
}

#[tokio::test]
async fn test_export_skips_missing_pack_dirs() {
    let dir = TempDir::new().unwrap();
    let mount = dir.path().join("srv1");
    let staging = dir.path().join("staging");
    fs::create_dir_all(mount.join("worlds/Bare")).unwrap();
    fs::write(mount.join("worlds/Bare/levelname.txt"), b"Bare").unwrap();

    export_from(&mount, "Bare", &staging).await.unwrap();

    assert!(staging.join("levelname.txt").is_file());
    assert!(!staging.join("behavior_packs").exists());
    assert!(!staging.join("resource_packs").exists());
}

#[tokio::test]
async fn test_export_unknown_world() {
    let dir = TempDir::new().unwrap();
    let err = export_from(dir.path(), "Nope", &dir.path().join("staging"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorldError::WorldNotFound(_)));
}

#[tokio::test]
async fn test_map_layout_dispatches_by_direction() {
    let dir = TempDir::new().unwrap();
    let package = dir.path().join("package");
    let mount = dir.path().join("srv1");
    let staging = dir.path().join("staging");
    extracted_package(&package);

    map_layout(Direction::PackageToDisk, &package, &mount, "MyWorld")
        .await
        .unwrap();
    assert!(mount.join("worlds/MyWorld/levelname.txt").is_file());

    map_layout(Direction::DiskToPackage, &mount, &staging, "MyWorld")
        .await
        .unwrap();
    assert!(staging.join("behavior_packs/AddonA/manifest.json").is_file());
}
