// Application settings - defaults, optional JSON file, environment overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "BedrockAnywhere";
const SETTINGS_FILE: &str = "settings.json";

pub const ENV_SERVERS_ROOT: &str = "BEDROCK_SERVERS_ROOT";
pub const ENV_SCRATCH_ROOT: &str = "BEDROCK_SCRATCH_ROOT";
pub const ENV_MAX_UPLOAD_BYTES: &str = "BEDROCK_MAX_UPLOAD_BYTES";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub servers_root: PathBuf,
    pub scratch_root: PathBuf,
    pub max_upload_bytes: u64,
    pub docker: DockerSettings,
    pub server_defaults: ServerDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerSettings {
    pub image: String,
    pub container_prefix: String,
    pub default_port: u16,
    pub port_range_start: u16,
    pub port_range_end: u16,
    pub restart_policy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerDefaults {
    pub gamemode: String,
    pub difficulty: String,
    pub max_players: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            servers_root: app_dir().join("servers"),
            scratch_root: std::env::temp_dir().join("bedrock-world-manager"),
            max_upload_bytes: 100 * 1024 * 1024,
            docker: DockerSettings::default(),
            server_defaults: ServerDefaults::default(),
        }
    }
}

impl Default for DockerSettings {
    fn default() -> Self {
        Self {
            image: "itzg/minecraft-bedrock-server".to_string(),
            container_prefix: "minecraft-".to_string(),
            default_port: 19132,
            port_range_start: 19132,
            port_range_end: 19200,
            restart_policy: "unless-stopped".to_string(),
        }
    }
}

impl Default for ServerDefaults {
    fn default() -> Self {
        Self {
            gamemode: "survival".to_string(),
            difficulty: "normal".to_string(),
            max_players: 20,
        }
    }
}

impl AppConfig {
    /// Load settings from `path` (or the default settings file) and apply
    /// environment overrides. A missing file just means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// `load` with overrides taken from `lookup` instead of the process environment
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_settings_path);

        let mut config = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<AppConfig>(&content)
                .map_err(|e| format!("Invalid settings file {}: {}", path.display(), e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings file at {}, using defaults", path.display());
                AppConfig::default()
            }
            Err(e) => {
                return Err(format!(
                    "Failed to read settings file {}: {}",
                    path.display(),
                    e
                ))
            }
        };

        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_SERVERS_ROOT).filter(|v| !v.is_empty()) {
            self.servers_root = PathBuf::from(root);
        }
        if let Some(root) = lookup(ENV_SCRATCH_ROOT).filter(|v| !v.is_empty()) {
            self.scratch_root = PathBuf::from(root);
        }
        if let Some(limit) = lookup(ENV_MAX_UPLOAD_BYTES) {
            self.max_upload_bytes = limit
                .trim()
                .parse()
                .map_err(|e| format!("Invalid {}: {}", ENV_MAX_UPLOAD_BYTES, e))?;
        }
        Ok(())
    }
}

fn app_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn default_settings_path() -> PathBuf {
    app_dir().join("config").join(SETTINGS_FILE)
}
