//! music-man Metadata
//!
//! Tag extraction and normalization for music-man.
//!
//! This crate provides:
//! - Tag reading from FLAC, MP3 and OGG files ([`LoftyMetadataReader`])
//! - Normalization of raw tag values into a usable [`TagSet`]
//! - Writing fresh tags into freshly encoded files
//!
//! # Example
//!
//! ```rust,no_run
//! use musicman_metadata::{normalize, LoftyMetadataReader, MetadataReader};
//! use std::path::Path;
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = LoftyMetadataReader::new();
//! let raw = reader.read(Path::new("/music/song.flac"))?;
//! let tags = normalize(raw)?;
//! println!("{} - {}", tags.artist, tags.title);
//! # Ok(())
//! # }
//! ```

mod error;
mod reader;
mod tags;

pub use error::{MetadataError, Result};
pub use reader::{LoftyMetadataReader, MetadataReader};
pub use tags::{normalize, normalize_date, normalize_track, ContainerFormat, RawTags, TagSet};
