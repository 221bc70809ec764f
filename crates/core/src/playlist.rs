//! Playlist and track domain model.

use serde::{Deserialize, Serialize};

use crate::status::{PlaylistStatus, TrackStatus};
use crate::types::{DbId, Timestamp};

/// Playlist names are the prompt truncated to this many characters.
pub const PLAYLIST_NAME_MAX_CHARS: usize = 50;

/// One generated audio asset with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: DbId,
    pub playlist_id: DbId,
    pub title: String,
    pub prompt: String,
    pub genre: Option<String>,
    pub mood: Option<String>,
    /// Requested length in seconds.
    pub duration: i32,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    pub status: TrackStatus,
    /// Set only when `status` is [`TrackStatus::Error`].
    pub error: Option<String>,
    /// Stable 0-based position within the playlist.
    pub track_order: i32,
    pub created_at: Timestamp,
}

impl Track {
    pub fn is_ready(&self) -> bool {
        self.status == TrackStatus::Ready
    }
}

/// Ordered collection of tracks generated from one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: DbId,
    pub owner_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub prompt: String,
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub cover_image_url: Option<String>,
    pub status: PlaylistStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Always sorted by `track_order`.
    pub tracks: Vec<Track>,
}

impl Playlist {
    pub fn ready_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_ready()).count()
    }

    /// The track currently being generated, if any.
    pub fn current_track(&self) -> Option<&Track> {
        self.tracks
            .iter()
            .find(|t| t.status == TrackStatus::Generating)
    }
}

/// Derive a playlist name from its prompt.
///
/// Prompts longer than [`PLAYLIST_NAME_MAX_CHARS`] characters are cut and
/// suffixed with `...`.
pub fn playlist_name(prompt: &str) -> String {
    if prompt.chars().count() <= PLAYLIST_NAME_MAX_CHARS {
        return prompt.to_string();
    }
    let mut name: String = prompt.chars().take(PLAYLIST_NAME_MAX_CHARS).collect();
    name.push_str("...");
    name
}

/// Aggregate status of a finished playlist.
///
/// - every track ready -> `Ready`
/// - at least one ready -> `Partial`
/// - none ready (or no tracks) -> `Error`
pub fn aggregate_status(tracks: &[Track]) -> PlaylistStatus {
    let ready = tracks.iter().filter(|t| t.is_ready()).count();
    if ready == 0 {
        PlaylistStatus::Error
    } else if ready == tracks.len() {
        PlaylistStatus::Ready
    } else {
        PlaylistStatus::Partial
    }
}
