/// Metadata reader implementation using lofty
use crate::error::{MetadataError, Result};
use crate::tags::{ContainerFormat, RawTags, TagSet};
use lofty::{Accessor, AudioFile, ItemKey, Tag, TagExt, TagType, TaggedFileExt};
use std::path::Path;

/// Reads and writes tags of audio files
///
/// Implemented by [`LoftyMetadataReader`] for real files; tests substitute an
/// in-memory table.
pub trait MetadataReader: Send + Sync {
    /// Read the raw tags of an audio file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed. A file that
    /// parses but carries no tags yields empty [`RawTags`].
    fn read(&self, path: &Path) -> Result<RawTags>;

    /// Write fresh tags into a file that has none
    ///
    /// # Errors
    /// Returns an error if the file already carries tags of the target kind
    /// or cannot be written
    fn write(&self, path: &Path, tags: &TagSet) -> Result<()>;
}

/// Metadata reader using the lofty library
pub struct LoftyMetadataReader;

impl LoftyMetadataReader {
    /// Create a new metadata reader
    pub fn new() -> Self {
        Self
    }

    /// Extract the identifying fields from a lofty tag
    fn extract_from_tag(tag: &Tag) -> RawTags {
        let text = |keys: &[ItemKey]| {
            keys.iter()
                .find_map(|key| tag.get_string(key).filter(|s| !s.trim().is_empty()))
                .map(|s| s.to_string())
        };

        RawTags {
            artist: text(&[ItemKey::TrackArtist]),
            album: text(&[ItemKey::AlbumTitle]),
            title: text(&[ItemKey::TrackTitle]),
            track: text(&[
                ItemKey::TrackNumber,
                ItemKey::Unknown("TRACK".to_string()),
            ]),
            date: text(&[
                ItemKey::RecordingDate,
                ItemKey::Year,
                ItemKey::Unknown("YEAR".to_string()),
                ItemKey::OriginalReleaseDate,
            ]),
            channels: None,
        }
    }

    fn tag_type_for(path: &Path) -> Result<TagType> {
        match ContainerFormat::from_path(path) {
            Some(ContainerFormat::Mp3) => Ok(TagType::Id3v2),
            Some(ContainerFormat::Flac | ContainerFormat::Ogg) => Ok(TagType::VorbisComments),
            None => Err(MetadataError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl Default for LoftyMetadataReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataReader for LoftyMetadataReader {
    fn read(&self, path: &Path) -> Result<RawTags> {
        if !path.exists() {
            return Err(MetadataError::FileNotFound(path.display().to_string()));
        }

        let tagged_file = lofty::read_from_path(path)
            .map_err(|e| MetadataError::ParseError(format!("{}: {}", path.display(), e)))?;

        // Primary tag is ID3v2 for MP3, Vorbis comments for FLAC/OGG
        let mut raw = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
            .map(Self::extract_from_tag)
            .unwrap_or_default();

        raw.channels = tagged_file.properties().channels();

        Ok(raw)
    }

    fn write(&self, path: &Path, tags: &TagSet) -> Result<()> {
        let tag_type = Self::tag_type_for(path)?;

        let tagged_file = lofty::read_from_path(path)
            .map_err(|e| MetadataError::ParseError(format!("{}: {}", path.display(), e)))?;
        if tagged_file.tag(tag_type).is_some() {
            return Err(MetadataError::WriteError(format!(
                "{} already has {:?} tags present",
                path.display(),
                tag_type
            )));
        }

        let mut tag = Tag::new(tag_type);
        tag.set_artist(tags.artist.clone());
        tag.set_album(tags.album.clone());
        tag.set_title(tags.title.clone());

        if let Some(track) = tags.track {
            tag.set_track(track);
        }

        if let Some(date) = &tags.date {
            tag.insert_text(ItemKey::RecordingDate, date.clone());
        }

        tag.save_to_path(path)
            .map_err(|e| MetadataError::WriteError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Wrote {:?} tags to {:?}", tag_type, path);

        Ok(())
    }
}
