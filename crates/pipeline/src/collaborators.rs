//! Seams between the orchestrator and the outside world.
//!
//! Production implementations live in [`crate::adapters`]; tests use
//! in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;
use hyde_core::error::ServiceError;
use hyde_core::generation::{PlaylistDraft, TrackDraft};
use hyde_core::playlist::Playlist;
use hyde_core::types::DbId;
use hyde_db::models::playlist::UpdatePlaylist;
use hyde_db::models::track::UpdateTrack;
use hyde_providers::ImagePurpose;

/// Durable playlist and track records.
///
/// Updates must be idempotent: the orchestrator retries them.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    /// Create a playlist with its tracks, all or nothing.
    async fn create_with_tracks(
        &self,
        playlist: &PlaylistDraft,
        tracks: &[TrackDraft],
    ) -> Result<Playlist, ServiceError>;

    async fn update_playlist(&self, id: DbId, patch: &UpdatePlaylist) -> Result<(), ServiceError>;

    async fn update_track(&self, id: DbId, patch: &UpdateTrack) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRequest {
    pub prompt: String,
    pub duration_secs: i32,
    pub instrumental: bool,
}

/// Text-to-music generation. Returns a playable URL (possibly `data:`).
#[async_trait]
pub trait AudioGenerator: Send + Sync {
    async fn generate_audio(&self, request: &AudioRequest) -> Result<String, ServiceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub purpose: ImagePurpose,
    pub genre: Option<String>,
    pub mood: Option<String>,
}

/// Cover and thumbnail generation. Returns an image URL (possibly `data:`).
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, ServiceError>;
}

/// The set of collaborators one orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn PlaylistStore>,
    pub audio: Arc<dyn AudioGenerator>,
    pub images: Arc<dyn ImageGenerator>,
}
