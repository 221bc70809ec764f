//! Track row model and update DTO.

use hyde_core::error::CoreError;
use hyde_core::playlist::Track;
use hyde_core::status::{StatusId, TrackStatus};
use hyde_core::types::{DbId, Timestamp};
use serde::Deserialize;
use sqlx::FromRow;

/// A row from the `tracks` table.
#[derive(Debug, Clone, FromRow)]
pub struct TrackRow {
    pub id: DbId,
    pub playlist_id: DbId,
    pub title: String,
    pub prompt: String,
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub duration: i32,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    pub status_id: StatusId,
    pub error: Option<String>,
    pub track_order: i32,
    pub created_at: Timestamp,
}

impl TryFrom<TrackRow> for Track {
    type Error = CoreError;

    fn try_from(row: TrackRow) -> Result<Self, Self::Error> {
        Ok(Track {
            id: row.id,
            playlist_id: row.playlist_id,
            title: row.title,
            prompt: row.prompt,
            genre: row.genre,
            mood: row.mood,
            duration: row.duration,
            audio_url: row.audio_url,
            image_url: row.image_url,
            status: TrackStatus::from_id(row.status_id)?,
            error: row.error,
            track_order: row.track_order,
            created_at: row.created_at,
        })
    }
}

/// DTO for patching a track. Only `Some` fields are applied.
///
/// Moving to any status other than `error` clears the stored error
/// message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateTrack {
    pub title: Option<String>,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<TrackStatus>,
    pub error: Option<String>,
}

impl UpdateTrack {
    pub fn status(status: TrackStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn ready(audio_url: String, image_url: Option<String>) -> Self {
        Self {
            audio_url: Some(audio_url),
            image_url,
            status: Some(TrackStatus::Ready),
            ..Default::default()
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            status: Some(TrackStatus::Error),
            error: Some(error),
            ..Default::default()
        }
    }
}
