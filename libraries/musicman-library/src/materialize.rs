//! Track materialization
//!
//! Puts a single track at its destination:
//!
//! 1. the destination album directory is created, `*.log` files of the source
//!    album directory are mirrored into it and the provenance record is
//!    written once
//! 2. the audio is hard-linked, copied or transcoded into place
//!
//! A failure in step 2 removes whatever was written at the destination before
//! the error is returned. Directory preparation is never rolled back.

use crate::copy::{lazy_copy, PartialFile};
use crate::options::RunOptions;
use crate::transcode::{TargetFormat, Transcoder};
use crate::types::Track;
use crate::{LibraryError, Result};
use musicman_metadata::MetadataReader;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the provenance record kept in every destination album directory
pub const PROVENANCE_FILE: &str = "moved_from";

/// Extension of album log files mirrored with the audio
const LOG_EXTENSION: &str = ".log";

/// Lifecycle of a track's materialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeState {
    /// Nothing done yet; also the final state of a dry run
    Pending,
    DirectoryPrepared,
    Written,
    Failed,
    /// Partial output removed after a failure
    Aborted,
}

/// What to write at the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Same container as the source
    Copy,
    Transcode { target: TargetFormat, quality: i32 },
}

/// Writes tracks into a destination library
pub struct Materializer<'a> {
    options: &'a RunOptions,
    transcoder: &'a dyn Transcoder,
    tagger: &'a dyn MetadataReader,
}

impl<'a> Materializer<'a> {
    pub fn new(
        options: &'a RunOptions,
        transcoder: &'a dyn Transcoder,
        tagger: &'a dyn MetadataReader,
    ) -> Self {
        Self {
            options,
            transcoder,
            tagger,
        }
    }

    /// Materialize `track` at `dest`, which must not exist yet.
    ///
    /// Returns the state reached: `Written` on success, `Pending` in dry-run
    /// mode. Errors leave no file at `dest`.
    pub async fn materialize(
        &self,
        track: &Track,
        dest: &Path,
        payload: Payload,
    ) -> Result<MaterializeState> {
        let verb = match payload {
            Payload::Copy => "Copying",
            Payload::Transcode { .. } => "Transcoding",
        };

        if self.options.dry_run {
            info!("{} {} from {} (dry run)", verb, dest.display(), track.source_path.display());
            return Ok(MaterializeState::Pending);
        }

        info!("{} {} from {}", verb, dest.display(), track.source_path.display());

        let dest_dir = dest
            .parent()
            .ok_or_else(|| LibraryError::InvalidPath(dest.display().to_string()))?;
        self.prepare_directory(track.source_dir(), dest_dir)?;
        debug!("{:?}: {:?}", dest, MaterializeState::DirectoryPrepared);

        let guard = PartialFile::new(dest);
        match self.write_payload(track, dest, payload).await {
            Ok(()) => {
                guard.keep();
                Ok(MaterializeState::Written)
            }
            Err(e) if e.is_already_exists() => {
                // Someone else's file; leave it alone
                guard.keep();
                Err(e)
            }
            Err(e) => {
                debug!("{:?}: {:?} ({})", dest, MaterializeState::Failed, e);
                drop(guard);
                debug!("{:?}: {:?}", dest, MaterializeState::Aborted);
                Err(e)
            }
        }
    }

    async fn write_payload(&self, track: &Track, dest: &Path, payload: Payload) -> Result<()> {
        match payload {
            Payload::Copy => {
                let method = lazy_copy(&track.source_path, dest, !self.options.copy_only)?;
                debug!("Placed {:?} by {:?}", dest, method);
                Ok(())
            }
            Payload::Transcode { target, quality } => {
                // Claim the destination before the encoder runs
                OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(dest)
                    .map_err(LibraryError::fs("create", dest))?;

                self.transcoder
                    .transcode(&track.source_path, dest, target, quality)
                    .await?;

                if target.needs_tagging() {
                    self.tagger.write(dest, &track.tags)?;
                }
                Ok(())
            }
        }
    }

    /// Create `dest_dir` and bring over the album's logs and provenance
    pub fn prepare_directory(&self, source_dir: &Path, dest_dir: &Path) -> Result<()> {
        fs::create_dir_all(dest_dir).map_err(LibraryError::fs("create directory", dest_dir))?;

        self.mirror_logs(source_dir, dest_dir)?;
        self.write_provenance(source_dir, dest_dir)
    }

    fn mirror_logs(&self, source_dir: &Path, dest_dir: &Path) -> Result<()> {
        let entries = fs::read_dir(source_dir).map_err(LibraryError::fs("read directory", source_dir))?;

        for entry in entries {
            let entry = entry.map_err(LibraryError::fs("read directory", source_dir))?;
            let name = entry.file_name();
            if !name.to_string_lossy().ends_with(LOG_EXTENSION) {
                continue;
            }
            // Follows symlinks
            if !entry.path().is_file() {
                continue;
            }

            let target = dest_dir.join(&name);
            if target.exists() {
                continue;
            }

            match lazy_copy(&entry.path(), &target, !self.options.copy_only) {
                Ok(_) => debug!("Mirrored log {:?}", target),
                Err(e) if e.is_already_exists() => {}
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Write the provenance record of `dest_dir` unless it already has one
    pub fn write_provenance(&self, source_dir: &Path, dest_dir: &Path) -> Result<()> {
        let target = dest_dir.join(PROVENANCE_FILE);
        let inherited = source_dir.join(PROVENANCE_FILE);

        let result = if inherited.is_file() {
            lazy_copy(&inherited, &target, !self.options.copy_only).map(|_| ())
        } else {
            let origin = absolute(source_dir)?;
            write_new(&target, format!("{}\n", origin.display()).as_bytes())
        };

        match result {
            Ok(()) => {
                debug!("Wrote provenance record {:?}", target);
                Ok(())
            }
            Err(e) if e.is_already_exists() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(LibraryError::fs("resolve", path))?;
    Ok(cwd.join(path))
}

fn write_new(path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(LibraryError::fs("create", path))?;
    let guard = PartialFile::new(path);

    file.write_all(contents)
        .and_then(|()| file.flush())
        .map_err(LibraryError::fs("write", path))?;

    guard.keep();
    Ok(())
}
