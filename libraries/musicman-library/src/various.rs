//! Various-artists resolution
//!
//! Tracks are grouped by album identity (year + album name, across the whole
//! scan rather than per directory). A group whose tracks name more than one
//! distinct artist is filed under "Various Artists".

use crate::types::{ResolvedTrack, Track};
use musicman_metadata::TagSet;
use std::collections::{HashMap, HashSet};

/// Date used for grouping when a track has none
pub const UNKNOWN_DATE: &str = "0000";

/// Album identity used for various-artists grouping
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlbumKey {
    pub date: String,
    pub album: String,
}

impl AlbumKey {
    pub fn of(tags: &TagSet) -> Self {
        Self {
            date: tags.date.clone().unwrap_or_else(|| UNKNOWN_DATE.to_string()),
            album: tags.album.clone(),
        }
    }
}

/// Decide, per album key, whether the album spans several artists
pub fn various_artist_albums(tracks: &[Track]) -> HashMap<AlbumKey, bool> {
    let artists_by_album = tracks.iter().fold(
        HashMap::<AlbumKey, HashSet<&str>>::new(),
        |mut acc, track| {
            acc.entry(AlbumKey::of(&track.tags))
                .or_default()
                .insert(track.tags.artist.as_str());
            acc
        },
    );

    artists_by_album
        .into_iter()
        .map(|(key, artists)| (key, artists.len() > 1))
        .collect()
}

/// Attach the various-artists flag of its album to every track
pub fn resolve(tracks: Vec<Track>) -> Vec<ResolvedTrack> {
    let flags = various_artist_albums(&tracks);

    tracks
        .into_iter()
        .map(|track| {
            let various_artists = flags
                .get(&AlbumKey::of(&track.tags))
                .copied()
                .unwrap_or(false);
            ResolvedTrack {
                track,
                various_artists,
            }
        })
        .collect()
}
