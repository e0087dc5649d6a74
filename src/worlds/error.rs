// World pipeline errors

use serde::Serialize;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorldError {
    #[error("Malformed world package: {0}")]
    MalformedArchive(String),

    #[error("Invalid world package: {0}")]
    InvalidPackageFormat(String),

    #[error("World package is too large: {size} bytes (limit {limit} bytes)")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("World not found: {0}")]
    WorldNotFound(String),

    #[error("Filesystem error while {context}: {source}")]
    Filesystem {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write world package: {0}")]
    ArchiveWrite(String),

    #[error("World id '{id}' is ambiguous: {}", .candidates.join(", "))]
    AmbiguousWorld { id: String, candidates: Vec<String> },

    #[error("Operation cancelled")]
    Cancelled,
}

/// Coarse failure class so callers know whether retrying with different input can help
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    BadPackage,
    BadName,
    NotFound,
    Storage,
}

impl WorldError {
    pub fn filesystem(context: impl Into<String>, source: io::Error) -> Self {
        WorldError::Filesystem {
            context: context.into(),
            source,
        }
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            WorldError::MalformedArchive(_)
            | WorldError::InvalidPackageFormat(_)
            | WorldError::PayloadTooLarge { .. } => FailureCategory::BadPackage,
            WorldError::InvalidName(_) | WorldError::AmbiguousWorld { .. } => {
                FailureCategory::BadName
            }
            WorldError::WorldNotFound(_) => FailureCategory::NotFound,
            WorldError::Filesystem { .. } | WorldError::ArchiveWrite(_) | WorldError::Cancelled => {
                FailureCategory::Storage
            }
        }
    }

    /// Message safe to show outside the process: storage failures keep the
    /// operation and the I/O error kind but drop OS messages that embed paths.
    pub fn user_message(&self) -> String {
        match self {
            WorldError::Filesystem { context, source } => {
                format!("Internal storage failure while {} ({:?})", context, source.kind())
            }
            WorldError::ArchiveWrite(_) => "Failed to build the world package".to_string(),
            other => other.to_string(),
        }
    }
}

/// Shorthand for `map_err` on filesystem calls
pub(crate) fn io_context(context: impl Into<String>) -> impl FnOnce(io::Error) -> WorldError {
    let context = context.into();
    move |source| WorldError::Filesystem { context, source }
}
