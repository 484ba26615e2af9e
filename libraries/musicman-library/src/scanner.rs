//! Library scanning
//!
//! Walks one or more library roots, reads the tags of every file with an
//! accepted extension and keeps the files whose tags identify a track.

use crate::types::Track;
use crate::{LibraryError, Result};
use musicman_metadata::{normalize, ContainerFormat, MetadataReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Result of scanning one or more roots
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Tracks with usable tags, in walk order
    pub tracks: Vec<Track>,

    /// Files dropped for insufficient tags, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

/// Scanner producing [`Track`]s from library directories
pub struct LibraryScanner<'a> {
    reader: &'a dyn MetadataReader,
    formats: Vec<ContainerFormat>,
    follow_links: bool,
}

impl<'a> LibraryScanner<'a> {
    /// Create a scanner accepting every supported format
    pub fn new(reader: &'a dyn MetadataReader) -> Self {
        Self {
            reader,
            formats: ContainerFormat::ALL.to_vec(),
            follow_links: false,
        }
    }

    /// Restrict the scan to the given formats
    pub fn with_formats(mut self, formats: &[ContainerFormat]) -> Self {
        self.formats = formats.to_vec();
        self
    }

    /// Set whether to follow symbolic links
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    fn accepts(&self, path: &Path) -> Option<ContainerFormat> {
        ContainerFormat::from_path(path).filter(|format| self.formats.contains(format))
    }

    /// Scan a single root directory
    pub fn scan_directory(&self, root: &Path, report: &mut ScanReport) -> Result<()> {
        if !root.exists() {
            return Err(LibraryError::FileNotFound(root.display().to_string()));
        }

        if !root.is_dir() {
            return Err(LibraryError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let walker = WalkDir::new(root)
            .follow_links(self.follow_links)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry?;
            // Symlinked files count as tracks even when links are not followed
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }

            let path = entry.path();
            let Some(format) = self.accepts(path) else {
                continue;
            };

            match self.reader.read(path).and_then(normalize) {
                Ok(tags) => {
                    debug!("Scanned {:?}: {} - {}", path, tags.artist, tags.title);
                    report.tracks.push(Track::new(path, format, tags));
                }
                Err(e) if e.is_skippable() => {
                    warn!("Skipping {}: {}", path.display(), e);
                    report.skipped.push((path.to_path_buf(), e.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Scan several roots, in the order given
    pub fn scan_directories(&self, roots: &[PathBuf]) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        for root in roots {
            self.scan_directory(root, &mut report)?;
        }

        debug!(
            "Scan finished: {} tracks, {} skipped",
            report.tracks.len(),
            report.skipped.len()
        );

        Ok(report)
    }
}
