// Name and port validation shared by the world pipeline and the server commands

use std::ops::RangeInclusive;

const MAX_SERVER_NAME_LEN: usize = 50;
const MAX_WORLD_DIR_NAME_BYTES: usize = 255;

pub const PORT_RANGE: RangeInclusive<u16> = 1024..=65535;
pub const BEDROCK_PORT_RANGE: RangeInclusive<u16> = 19132..=19200;

/// Validate a server mount label (also used as the container name suffix)
pub fn validate_server_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Server name is required".to_string());
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(
            "Server name can only contain letters, numbers, dots, underscores, and hyphens"
                .to_string(),
        );
    }

    // Only "." and ".." can pass the charset and still escape the servers root
    if name == "." || name == ".." {
        return Err(format!("Server name cannot be '{}'", name));
    }

    if name.len() > MAX_SERVER_NAME_LEN {
        return Err(format!(
            "Server name must be {} characters or less",
            MAX_SERVER_NAME_LEN
        ));
    }

    Ok(())
}

/// Validate a world name read from a package identity file before it becomes
/// a directory under `worlds/`. Level names may contain spaces and Unicode, so
/// this only rejects what cannot be a single path component.
pub fn validate_world_dir_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("World name is empty".to_string());
    }

    if name == "." || name == ".." {
        return Err(format!("World name cannot be '{}'", name));
    }

    if name.contains(['/', '\\', '\0']) {
        return Err(format!(
            "World name '{}' contains a path separator or NUL byte",
            name.escape_default()
        ));
    }

    if name.len() > MAX_WORLD_DIR_NAME_BYTES {
        return Err(format!(
            "World name must be {} bytes or less",
            MAX_WORLD_DIR_NAME_BYTES
        ));
    }

    Ok(())
}

pub fn validate_port(port: u16) -> Result<(), String> {
    if !PORT_RANGE.contains(&port) {
        return Err(format!(
            "Port must be between {} and {}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ));
    }
    Ok(())
}

pub fn validate_bedrock_port(port: u16) -> Result<(), String> {
    validate_port(port)?;

    if !BEDROCK_PORT_RANGE.contains(&port) {
        return Err(format!(
            "Bedrock server port should be between {} and {}",
            BEDROCK_PORT_RANGE.start(),
            BEDROCK_PORT_RANGE.end()
        ));
    }
    Ok(())
}
