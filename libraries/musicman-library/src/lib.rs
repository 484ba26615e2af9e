//! music-man Library
//!
//! Reconciles music libraries: scans tagged audio files, lays them out as
//! `Artist/Album [Year]/NN - Title.ext` and materializes them into an output
//! library by hard link, copy or transcode.
//!
//! # Architecture
//!
//! - `scanner`: Library walking and tag extraction
//! - `various`: Various-artists album detection
//! - `path_template`: Destination path derivation
//! - `copy`: Hard-link-or-copy placement
//! - `transcode`: FLAC to MP3/OGG through external encoders
//! - `materialize`: Per-track directory preparation and writing
//! - `reconcile`: The copy, copy-diff, copy-intersect, transcode and delete commands

mod error;
mod types;

pub mod copy;
pub mod materialize;
pub mod options;
pub mod path_template;
pub mod reconcile;
pub mod scanner;
pub mod transcode;
pub mod various;

pub use error::LibraryError;
pub use options::{RunOptions, TranscodeSettings};
pub use reconcile::{Command, Reconciler};
pub use transcode::{ProcessTranscoder, TargetFormat, Transcoder};
pub use types::*;

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, LibraryError>;
