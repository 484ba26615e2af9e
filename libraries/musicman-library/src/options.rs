//! Run options shared by every command

use crate::{LibraryError, Result};
use musicman_metadata::ContainerFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// External encoder locations and default qualities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeSettings {
    pub flac_path: PathBuf,
    pub lame_path: PathBuf,
    pub oggenc_path: PathBuf,

    /// LAME VBR quality, 0 (best) to 9
    pub mp3_quality: i32,

    /// oggenc quality, -1 to 10 (best)
    pub ogg_quality: i32,
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        Self {
            flac_path: PathBuf::from("flac"),
            lame_path: PathBuf::from("lame"),
            oggenc_path: PathBuf::from("oggenc"),
            mp3_quality: 1,
            ogg_quality: 6,
        }
    }
}

/// Behaviour switches for a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Log planned operations without touching the filesystem
    pub dry_run: bool,

    /// Replace existing destination files
    pub force: bool,

    /// Always copy, never hard-link
    pub copy_only: bool,

    /// transcode: copy tracks with more than two channels unchanged
    pub keep_multichannel: bool,

    /// Follow symbolic links while scanning
    pub follow_links: bool,

    /// Formats picked up by scans of source libraries
    pub extensions: Vec<ContainerFormat>,

    /// Extensions probed, in order, when looking a track up in a reference library
    pub match_extensions: Vec<ContainerFormat>,

    pub transcode: TranscodeSettings,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            force: false,
            copy_only: false,
            keep_multichannel: false,
            follow_links: false,
            extensions: ContainerFormat::ALL.to_vec(),
            match_extensions: ContainerFormat::ALL.to_vec(),
            transcode: TranscodeSettings::default(),
        }
    }
}

impl RunOptions {
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(LibraryError::Config(
                "at least one scan extension is required".to_string(),
            ));
        }
        if self.match_extensions.is_empty() {
            return Err(LibraryError::Config(
                "at least one match extension is required".to_string(),
            ));
        }
        Ok(())
    }
}
