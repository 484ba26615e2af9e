//! Common types for library reconciliation

use crate::path_template;
use musicman_metadata::{ContainerFormat, TagSet};
use std::path::{Path, PathBuf};

/// A scanned audio file with usable tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Original file path
    pub source_path: PathBuf,

    /// Container format, from the file extension
    pub format: ContainerFormat,

    /// Normalized tags
    pub tags: TagSet,
}

impl Track {
    pub fn new(source_path: impl Into<PathBuf>, format: ContainerFormat, tags: TagSet) -> Self {
        Self {
            source_path: source_path.into(),
            format,
            tags,
        }
    }

    /// Directory holding the source file (the source album directory)
    pub fn source_dir(&self) -> &Path {
        self.source_path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// A track together with the various-artists decision for its album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub track: Track,
    pub various_artists: bool,
}

impl ResolvedTrack {
    /// Destination path relative to a library root, for the given extension
    pub fn destination(&self, extension: &str) -> PathBuf {
        path_template::derive_path(&self.track.tags, self.various_artists, extension)
    }
}

/// Why a track produced no output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The destination file is already there and force mode is off
    DestinationExists,
    /// copy-diff: the track exists in the reference library
    Matched,
    /// copy-intersect: the track does not exist in the reference library
    Unmatched,
    /// delete: there is no destination file to remove
    NothingToDelete,
}

/// Summary of a reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tracks with usable tags found by the scan
    pub scanned: usize,

    /// Files dropped for missing artist/album/title
    pub skipped_tags: usize,

    /// Tracks materialized (planned, in dry-run mode)
    pub written: usize,

    /// Existing destinations replaced in force mode
    pub overwritten: usize,

    pub skipped_existing: usize,
    pub skipped_matched: usize,
    pub skipped_unmatched: usize,

    /// Destination files removed by `delete`
    pub deleted: usize,
    pub nothing_to_delete: usize,
}

impl RunSummary {
    pub fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::DestinationExists => self.skipped_existing += 1,
            SkipReason::Matched => self.skipped_matched += 1,
            SkipReason::Unmatched => self.skipped_unmatched += 1,
            SkipReason::NothingToDelete => self.nothing_to_delete += 1,
        }
    }

    /// Total number of tracks that produced no output
    pub fn skipped(&self) -> usize {
        self.skipped_existing + self.skipped_matched + self.skipped_unmatched + self.nothing_to_delete
    }

    pub fn summary_text(&self) -> String {
        let mut text = format!(
            "{} tracks scanned ({} without usable tags): {} written, {} overwritten, {} skipped",
            self.scanned,
            self.skipped_tags,
            self.written,
            self.overwritten,
            self.skipped()
        );
        if self.deleted > 0 {
            text.push_str(&format!(", {} deleted", self.deleted));
        }
        text
    }
}
