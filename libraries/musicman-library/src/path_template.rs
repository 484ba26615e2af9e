//! Destination path derivation
//!
//! Every destination is laid out as
//!
//! ```text
//! {Artist | Various Artists}/{Album}[ [{Year}]]/{TrackNo:02} - {Title}.{ext}
//! ```
//!
//! with the track prefix dropped when the track number is unknown. Each tag
//! value is sanitized on its own before the path is composed, so separators
//! inside tag values never produce extra directories.

use musicman_metadata::TagSet;
use std::path::PathBuf;

/// Artist segment used for albums spanning several artists
pub const VARIOUS_ARTISTS: &str = "Various Artists";

/// Replacements applied, in order, to every filename part
const FILENAME_REPLACE: &[(char, &str)] = &[('/', "-")];

/// Characters deleted from every filename part
const FILENAME_DELETE: &[char] = &['\'', '"', '?', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

/// Stand-in for a part that sanitizes to nothing (or only dots)
const EMPTY_PART: &str = "_";

/// Sanitize a single tag value for use as (part of) a path segment
pub fn sanitize_filename_part(part: &str) -> String {
    let mut clean = part.to_string();
    for (from, to) in FILENAME_REPLACE {
        clean = clean.replace(*from, to);
    }
    clean.retain(|c| !FILENAME_DELETE.contains(&c));

    // "", "." and ".." would collapse or escape the directory layout
    if clean.chars().all(|c| c == '.') {
        return EMPTY_PART.to_string();
    }

    clean
}

/// Derive the destination path of a track, relative to the library root
pub fn derive_path(tags: &TagSet, various_artists: bool, extension: &str) -> PathBuf {
    let artist = if various_artists {
        VARIOUS_ARTISTS.to_string()
    } else {
        sanitize_filename_part(&tags.artist)
    };

    let mut album = sanitize_filename_part(&tags.album);
    if let Some(date) = tags.date.as_deref().filter(|d| is_year(d)) {
        album = format!("{} [{}]", album, date);
    }

    let title = sanitize_filename_part(&tags.title);
    let file_name = match tags.track.filter(|&n| n > 0) {
        Some(track) => format!("{:02} - {}.{}", track, title, extension),
        None => format!("{}.{}", title, extension),
    };

    [artist, album, file_name].iter().collect()
}

fn is_year(date: &str) -> bool {
    date.len() == 4 && date.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_full_path() {
        let tags = TagSet::new("Queen", "A Night at the Opera", "Bohemian Rhapsody")
            .with_track(11)
            .with_date("1975");

        assert_eq!(
            derive_path(&tags, false, "flac"),
            PathBuf::from("Queen/A Night at the Opera [1975]/11 - Bohemian Rhapsody.flac")
        );
    }

    #[test]
    fn test_various_artists_segment() {
        let tags = TagSet::new("A", "X", "T1").with_track(1).with_date("1999");
        assert_eq!(
            derive_path(&tags, true, "mp3"),
            PathBuf::from("Various Artists/X [1999]/01 - T1.mp3")
        );
    }

    #[test]
    fn test_missing_track_and_date() {
        let tags = TagSet::new("Artist", "Album", "Title");
        assert_eq!(
            derive_path(&tags, false, "ogg"),
            PathBuf::from("Artist/Album/Title.ogg")
        );
    }

    #[test]
    fn test_track_number_padding() {
        let tags = TagSet::new("Artist", "Album", "Title").with_track(5);
        let path = derive_path(&tags, false, "mp3");
        assert_eq!(path.file_name().unwrap().to_string_lossy(), "05 - Title.mp3");

        let tags = TagSet::new("Artist", "Album", "Title").with_track(123);
        let path = derive_path(&tags, false, "mp3");
        assert_eq!(path.file_name().unwrap().to_string_lossy(), "123 - Title.mp3");
    }

    #[test]
    fn test_sanitize_filename_part() {
        assert_eq!(sanitize_filename_part("Valid Name"), "Valid Name");
        assert_eq!(sanitize_filename_part("AC/DC"), "AC-DC");
        assert_eq!(sanitize_filename_part("Don't Stop"), "Dont Stop");
        assert_eq!(sanitize_filename_part("Say \"Hello\"?"), "Say Hello");
        assert_eq!(sanitize_filename_part("\u{201C}Quoted\u{201D} \u{2018}x\u{2019}"), "Quoted x");
        assert_eq!(sanitize_filename_part("Song: The Remix"), "Song: The Remix");
    }

    #[test]
    fn test_sanitize_never_yields_empty_or_dot_segments() {
        assert_eq!(sanitize_filename_part("???"), "_");
        assert_eq!(sanitize_filename_part(""), "_");
        assert_eq!(sanitize_filename_part(".."), "_");
        assert_eq!(sanitize_filename_part("..."), "_");
        assert_eq!(sanitize_filename_part("...And Justice"), "...And Justice");
    }

    #[test]
    fn test_slash_in_tags_does_not_add_directories() {
        let tags = TagSet::new("AC/DC", "Live/Dead", "Back/In Black");
        let path = derive_path(&tags, false, "mp3");
        assert_eq!(path.components().count(), 3);
        assert_eq!(path, Path::new("AC-DC/Live-Dead/Back-In Black.mp3"));
    }

    #[test]
    fn test_non_year_date_is_ignored() {
        let mut tags = TagSet::new("A", "X", "T");
        tags.date = Some("99".to_string());
        assert_eq!(derive_path(&tags, false, "mp3"), PathBuf::from("A/X/T.mp3"));
    }
}
