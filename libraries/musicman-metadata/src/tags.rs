//! Tag records and normalization
//!
//! A [`RawTags`] is whatever a tag reader could pull out of a container. It is
//! turned into a [`TagSet`] by [`normalize`], which trims values, reduces
//! track numbers and dates to their canonical form and refuses records that
//! lack an artist, album or title.

use crate::error::{MetadataError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Audio container formats handled by the library tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Flac,
    Mp3,
    Ogg,
}

impl ContainerFormat {
    /// All supported formats, in the default comparison order
    pub const ALL: [ContainerFormat; 3] =
        [ContainerFormat::Flac, ContainerFormat::Mp3, ContainerFormat::Ogg];

    /// File extension (lowercase, without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Flac => "flac",
            ContainerFormat::Mp3 => "mp3",
            ContainerFormat::Ogg => "ogg",
        }
    }

    /// Parse a file extension, ignoring case
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| ext.eq_ignore_ascii_case(format.extension()))
    }

    /// Determine the container format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether the container holds lossless audio
    pub fn is_lossless(&self) -> bool {
        matches!(self, ContainerFormat::Flac)
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Tag values as extracted from a file, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTags {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    /// Track number as written in the tag (may be `3/12`)
    pub track: Option<String>,
    /// Date as written in the tag (may be a full timestamp)
    pub date: Option<String>,
    /// Channel count of the audio stream
    pub channels: Option<u8>,
}

/// Normalized, usable tags of a track
///
/// Artist, album and title are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagSet {
    pub artist: String,
    pub album: String,
    pub title: String,
    /// Track number, never zero
    pub track: Option<u32>,
    /// Four-digit year
    pub date: Option<String>,
    pub channels: Option<u8>,
}

impl TagSet {
    /// Create a tag set with only the required fields
    pub fn new(
        artist: impl Into<String>,
        album: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            artist: artist.into(),
            album: album.into(),
            title: title.into(),
            track: None,
            date: None,
            channels: None,
        }
    }

    pub fn with_track(mut self, track: u32) -> Self {
        self.track = Some(track);
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_channels(mut self, channels: u8) -> Self {
        self.channels = Some(channels);
        self
    }
}

/// Normalize raw tags into a usable [`TagSet`]
///
/// Returns [`MetadataError::InsufficientTags`] when artist, album or title is
/// missing or blank after trimming.
pub fn normalize(raw: RawTags) -> Result<TagSet> {
    let artist = clean_text(raw.artist);
    let album = clean_text(raw.album);
    let title = clean_text(raw.title);

    let (artist, album, title) = match (artist, album, title) {
        (Some(artist), Some(album), Some(title)) => (artist, album, title),
        (artist, album, title) => {
            let missing: Vec<&str> = [
                ("artist", artist.is_none()),
                ("album", album.is_none()),
                ("title", title.is_none()),
            ]
            .into_iter()
            .filter(|(_, absent)| *absent)
            .map(|(name, _)| name)
            .collect();

            return Err(MetadataError::InsufficientTags {
                missing: missing.join(", "),
            });
        }
    };

    Ok(TagSet {
        artist,
        album,
        title,
        track: raw.track.as_deref().and_then(normalize_track),
        date: raw.date.as_deref().and_then(normalize_date),
        channels: raw.channels,
    })
}

fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `"3/12"` -> 3. Zero and unparsable values count as absent.
pub fn normalize_track(track: &str) -> Option<u32> {
    let number = track.split('/').next().unwrap_or("").trim();
    match number.parse::<u32>() {
        Ok(0) => None,
        Ok(n) => Some(n),
        Err(_) => {
            tracing::debug!("Ignoring unparsable track number {:?}", track);
            None
        }
    }
}

/// Reduce a date tag to its first run of four digits.
pub fn normalize_date(date: &str) -> Option<String> {
    let bytes = date.trim().as_bytes();
    bytes
        .windows(4)
        .find(|window| window.iter().all(|b| b.is_ascii_digit()))
        .map(|window| String::from_utf8_lossy(window).into_owned())
}
