/// Metadata-specific errors
use thiserror::Error;

/// Result type alias using `MetadataError`
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Metadata error types
#[derive(Error, Debug)]
pub enum MetadataError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Unsupported container format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Not enough tags to identify the track (artist, album and title are required)
    #[error("Not enough tags could be read: missing {missing}")]
    InsufficientTags { missing: String },

    /// Tag parsing error
    #[error("Tag parsing error: {0}")]
    ParseError(String),

    /// Tag writing error
    #[error("Tag writing error: {0}")]
    WriteError(String),
}

impl MetadataError {
    /// Whether the owning track should be skipped with a warning rather than
    /// aborting the run.
    pub fn is_skippable(&self) -> bool {
        matches!(self, MetadataError::InsufficientTags { .. })
    }
}
