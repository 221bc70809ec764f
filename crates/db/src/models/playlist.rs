//! Playlist row model and update DTO.

use hyde_core::error::CoreError;
use hyde_core::playlist::{Playlist, Track};
use hyde_core::status::{PlaylistStatus, StatusId};
use hyde_core::types::{DbId, Timestamp};
use serde::Deserialize;
use sqlx::FromRow;

use super::track::TrackRow;

/// A row from the `playlists` table.
#[derive(Debug, Clone, FromRow)]
pub struct PlaylistRow {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub prompt: String,
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub cover_image_url: Option<String>,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A playlist row together with its tracks, sorted by `track_order`.
#[derive(Debug, Clone)]
pub struct PlaylistWithTracks {
    pub playlist: PlaylistRow,
    pub tracks: Vec<TrackRow>,
}

impl TryFrom<PlaylistWithTracks> for Playlist {
    type Error = CoreError;

    fn try_from(value: PlaylistWithTracks) -> Result<Self, Self::Error> {
        let PlaylistWithTracks { playlist: row, tracks } = value;
        let tracks = tracks
            .into_iter()
            .map(Track::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Playlist {
            id: row.id,
            owner_id: row.user_id,
            name: row.name,
            description: row.description,
            prompt: row.prompt,
            genre: row.genre,
            mood: row.mood,
            cover_image_url: row.cover_image_url,
            status: PlaylistStatus::from_id(row.status_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            tracks,
        })
    }
}

/// DTO for patching a playlist. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdatePlaylist {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub status: Option<PlaylistStatus>,
}

impl UpdatePlaylist {
    pub fn status(status: PlaylistStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn cover(cover_image_url: String) -> Self {
        Self {
            cover_image_url: Some(cover_image_url),
            ..Default::default()
        }
    }
}
