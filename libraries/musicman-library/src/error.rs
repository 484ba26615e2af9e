//! Error types for library reconciliation

use musicman_metadata::MetadataError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    /// Tag extraction or tag writing failed
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Directory creation, link, copy or removal failed
    #[error("Failed to {op} {}: {source}", .path.display())]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// An encoder or decoder exited unsuccessfully
    #[error("{stage} exited with {status}: {stderr}")]
    Transcode {
        stage: &'static str,
        status: String,
        stderr: String,
    },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl LibraryError {
    /// Build a `map_err` adapter for a filesystem operation on `path`
    pub(crate) fn fs(op: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| LibraryError::Filesystem { op, path, source }
    }

    /// Whether the failure was caused by the target already existing
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            LibraryError::Filesystem { source, .. } if source.kind() == io::ErrorKind::AlreadyExists
        )
    }
}
