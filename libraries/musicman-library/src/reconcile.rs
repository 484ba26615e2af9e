//! Reconciliation commands
//!
//! Every command scans its input libraries, resolves various-artists albums
//! and then walks the tracks through one shared decision loop: derive the
//! destination, skip or overwrite an existing file, materialize otherwise.

use crate::materialize::{Materializer, Payload};
use crate::options::RunOptions;
use crate::scanner::LibraryScanner;
use crate::transcode::{TargetFormat, Transcoder};
use crate::types::{ResolvedTrack, RunSummary, SkipReason};
use crate::various;
use crate::{LibraryError, Result};
use musicman_metadata::{ContainerFormat, MetadataReader};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A reconciliation to run against an output library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Materialize every track of the inputs in its own format
    Copy { inputs: Vec<PathBuf> },

    /// Materialize the tracks of `source` missing from `reference`
    CopyDiff {
        source: Vec<PathBuf>,
        reference: PathBuf,
    },

    /// Materialize the tracks of `source` also present in `reference`
    CopyIntersect {
        source: Vec<PathBuf>,
        reference: PathBuf,
    },

    /// Encode every lossless track of the inputs
    Transcode {
        inputs: Vec<PathBuf>,
        target: TargetFormat,
        quality: Option<i32>,
    },

    /// Remove the destinations the input tracks map to
    Delete {
        inputs: Vec<PathBuf>,
        target: Option<TargetFormat>,
    },
}

/// Decision for one track before its destination is looked at
enum Plan {
    Skip(SkipReason),
    Write {
        extension: &'static str,
        payload: Payload,
    },
}

/// Runs [`Command`]s
pub struct Reconciler<'a> {
    options: &'a RunOptions,
    reader: &'a dyn MetadataReader,
    transcoder: &'a dyn Transcoder,
}

impl<'a> Reconciler<'a> {
    /// `reader` extracts tags during scans and writes tags of encoded files
    pub fn new(
        options: &'a RunOptions,
        reader: &'a dyn MetadataReader,
        transcoder: &'a dyn Transcoder,
    ) -> Self {
        Self {
            options,
            reader,
            transcoder,
        }
    }

    /// Run `command`, writing into (or deleting from) `output`
    pub async fn run(&self, command: &Command, output: &Path) -> Result<RunSummary> {
        self.options.validate()?;
        let mut summary = RunSummary::default();

        match command {
            Command::Copy { inputs } => {
                let tracks = self.scan(inputs, &self.options.extensions, &mut summary)?;
                self.process(tracks, output, &mut summary, |track| Plan::Write {
                    extension: track.track.format.extension(),
                    payload: Payload::Copy,
                })
                .await?;
            }
            Command::CopyDiff { source, reference } => {
                check_reference(reference)?;
                let tracks = self.scan(source, &self.options.extensions, &mut summary)?;
                self.process(tracks, output, &mut summary, |track| {
                    match self.find_match(reference, track) {
                        Some(found) => {
                            debug!("{:?} matches {:?}", track.track.source_path, found);
                            Plan::Skip(SkipReason::Matched)
                        }
                        None => Plan::Write {
                            extension: track.track.format.extension(),
                            payload: Payload::Copy,
                        },
                    }
                })
                .await?;
            }
            Command::CopyIntersect { source, reference } => {
                check_reference(reference)?;
                let tracks = self.scan(source, &self.options.extensions, &mut summary)?;
                self.process(tracks, output, &mut summary, |track| {
                    match self.find_match(reference, track) {
                        Some(_) => Plan::Write {
                            extension: track.track.format.extension(),
                            payload: Payload::Copy,
                        },
                        None => Plan::Skip(SkipReason::Unmatched),
                    }
                })
                .await?;
            }
            Command::Transcode {
                inputs,
                target,
                quality,
            } => {
                let quality = target.resolve_quality(*quality, &self.options.transcode)?;
                let lossless: Vec<ContainerFormat> = ContainerFormat::ALL
                    .into_iter()
                    .filter(ContainerFormat::is_lossless)
                    .collect();
                let tracks = self.scan(inputs, &lossless, &mut summary)?;
                let target = *target;
                self.process(tracks, output, &mut summary, |track| {
                    if self.keeps_source_format(track) {
                        debug!(
                            "Keeping {:?} as {} ({:?} channels)",
                            track.track.source_path, track.track.format, track.track.tags.channels
                        );
                        Plan::Write {
                            extension: track.track.format.extension(),
                            payload: Payload::Copy,
                        }
                    } else {
                        Plan::Write {
                            extension: target.extension(),
                            payload: Payload::Transcode { target, quality },
                        }
                    }
                })
                .await?;
            }
            Command::Delete { inputs, target } => {
                let tracks = self.scan(inputs, &self.options.extensions, &mut summary)?;
                self.delete(&tracks, *target, output, &mut summary)?;
            }
        }

        debug!("Run finished: {:?}", summary);
        Ok(summary)
    }

    fn scan(
        &self,
        roots: &[PathBuf],
        formats: &[ContainerFormat],
        summary: &mut RunSummary,
    ) -> Result<Vec<ResolvedTrack>> {
        let report = LibraryScanner::new(self.reader)
            .with_formats(formats)
            .follow_links(self.options.follow_links)
            .scan_directories(roots)?;

        summary.scanned = report.tracks.len();
        summary.skipped_tags = report.skipped.len();

        Ok(various::resolve(report.tracks))
    }

    /// The shared per-track decision loop
    async fn process<F>(
        &self,
        tracks: Vec<ResolvedTrack>,
        output: &Path,
        summary: &mut RunSummary,
        plan: F,
    ) -> Result<()>
    where
        F: Fn(&ResolvedTrack) -> Plan,
    {
        let materializer = Materializer::new(self.options, self.transcoder, self.reader);

        for track in &tracks {
            let (extension, payload) = match plan(track) {
                Plan::Skip(reason) => {
                    debug!("Skipping {:?}: {:?}", track.track.source_path, reason);
                    summary.record_skip(reason);
                    continue;
                }
                Plan::Write { extension, payload } => (extension, payload),
            };

            let dest = output.join(track.destination(extension));

            if dest.exists() {
                if !self.options.force {
                    debug!("Skipping {}: destination exists", dest.display());
                    summary.record_skip(SkipReason::DestinationExists);
                    continue;
                }

                if self.options.dry_run {
                    info!("Overwriting {} (dry run)", dest.display());
                } else {
                    debug!("Removing {} to overwrite it", dest.display());
                    fs::remove_file(&dest).map_err(LibraryError::fs("remove", &dest))?;
                }
                summary.overwritten += 1;
            }

            materializer.materialize(&track.track, &dest, payload).await?;
            summary.written += 1;
        }

        Ok(())
    }

    fn delete(
        &self,
        tracks: &[ResolvedTrack],
        target: Option<TargetFormat>,
        output: &Path,
        summary: &mut RunSummary,
    ) -> Result<()> {
        for track in tracks {
            let extension = target
                .map(|t| t.extension())
                .unwrap_or_else(|| track.track.format.extension());
            let dest = output.join(track.destination(extension));

            if !dest.is_file() {
                debug!("Nothing to delete at {}", dest.display());
                summary.record_skip(SkipReason::NothingToDelete);
                continue;
            }

            if self.options.dry_run {
                info!("Deleting {} (dry run)", dest.display());
            } else {
                info!("Deleting {}", dest.display());
                fs::remove_file(&dest).map_err(LibraryError::fs("remove", &dest))?;
            }
            summary.deleted += 1;
        }

        Ok(())
    }

    /// First existing file in `reference` the track maps to, probing the
    /// match extensions in order
    fn find_match(&self, reference: &Path, track: &ResolvedTrack) -> Option<PathBuf> {
        self.options
            .match_extensions
            .iter()
            .map(|format| reference.join(track.destination(format.extension())))
            .find(|candidate| candidate.is_file())
    }

    fn keeps_source_format(&self, track: &ResolvedTrack) -> bool {
        self.options.keep_multichannel && track.track.tags.channels.is_some_and(|c| c > 2)
    }
}

fn check_reference(reference: &Path) -> Result<()> {
    if !reference.is_dir() {
        return Err(LibraryError::FileNotFound(format!(
            "reference library {}",
            reference.display()
        )));
    }
    Ok(())
}
