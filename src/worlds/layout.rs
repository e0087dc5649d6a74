// Reserved names shared by the package format and the server mount layout

use serde::{Deserialize, Serialize};
use std::fmt;

/// Plain-text file at the package root holding the world's canonical name
pub const IDENTITY_FILE: &str = "levelname.txt";

/// Directory under a server mount that holds one directory per world
pub const WORLDS_DIR: &str = "worlds";

pub const PACKAGE_EXTENSION: &str = "mcworld";

/// Add-on pack families. Each has a directory (package root on export,
/// server mount root on disk) and a manifest that stays beside the save data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackKind {
    Behavior,
    Resource,
}

impl PackKind {
    pub const ALL: [PackKind; 2] = [PackKind::Behavior, PackKind::Resource];

    pub fn dir_name(self) -> &'static str {
        match self {
            PackKind::Behavior => "behavior_packs",
            PackKind::Resource => "resource_packs",
        }
    }

    pub fn manifest_name(self) -> &'static str {
        match self {
            PackKind::Behavior => "world_behavior_packs.json",
            PackKind::Resource => "world_resource_packs.json",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.dir_name() == name)
    }

    pub fn from_manifest_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.manifest_name() == name)
    }
}

impl fmt::Display for PackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackKind::Behavior => write!(f, "behavior"),
            PackKind::Resource => write!(f, "resource"),
        }
    }
}

/// Role of a top-level entry in an extracted package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRole {
    AddonDir(PackKind),
    Manifest(PackKind),
    SaveData,
}

impl EntryRole {
    pub fn classify(name: &str) -> Self {
        if let Some(kind) = PackKind::from_dir_name(name) {
            EntryRole::AddonDir(kind)
        } else if let Some(kind) = PackKind::from_manifest_name(name) {
            EntryRole::Manifest(kind)
        } else {
            EntryRole::SaveData
        }
    }
}

/// File name used when a world is exported
pub fn package_file_name(world_name: &str) -> String {
    format!("{}.{}", world_name, PACKAGE_EXTENSION)
}
