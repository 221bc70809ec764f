//! Production collaborators: Postgres persistence and the provider clients.

use std::sync::Arc;

use async_trait::async_trait;
use hyde_core::error::ServiceError;
use hyde_core::generation::{PlaylistDraft, TrackDraft};
use hyde_core::playlist::Playlist;
use hyde_core::types::DbId;
use hyde_db::models::playlist::UpdatePlaylist;
use hyde_db::models::track::UpdateTrack;
use hyde_db::repositories::{PlaylistRepo, TrackRepo};
use hyde_db::DbPool;
use hyde_providers::music::AUDIO_CONTENT_TYPE;
use hyde_providers::{ImageClient, MusicClient, StorageBucket, StorageClient};

use crate::collaborators::{
    AudioGenerator, AudioRequest, Collaborators, ImageGenerator, ImageRequest, PlaylistStore,
};

/// Wire the production collaborators together.
pub fn production_collaborators(
    pool: DbPool,
    music: Arc<MusicClient>,
    images: Arc<ImageClient>,
    storage: Arc<StorageClient>,
) -> Collaborators {
    Collaborators {
        store: Arc::new(PgPlaylistStore::new(pool)),
        audio: Arc::new(ProviderAudio::new(music, Arc::clone(&storage))),
        images: Arc::new(ProviderImages::new(images, storage)),
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// [`PlaylistStore`] backed by the `hyde-db` repositories.
pub struct PgPlaylistStore {
    pool: DbPool,
}

impl PgPlaylistStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlaylistStore for PgPlaylistStore {
    async fn create_with_tracks(
        &self,
        playlist: &PlaylistDraft,
        tracks: &[TrackDraft],
    ) -> Result<Playlist, ServiceError> {
        let created = PlaylistRepo::create_with_tracks(&self.pool, playlist, tracks)
            .await
            .map_err(db_error)?;
        Playlist::try_from(created).map_err(|e| ServiceError::failed(e.to_string()))
    }

    async fn update_playlist(&self, id: DbId, patch: &UpdatePlaylist) -> Result<(), ServiceError> {
        PlaylistRepo::update(&self.pool, id, patch)
            .await
            .map_err(db_error)?
            .ok_or_else(|| not_found("Playlist"))?;
        Ok(())
    }

    async fn update_track(&self, id: DbId, patch: &UpdateTrack) -> Result<(), ServiceError> {
        TrackRepo::update(&self.pool, id, patch)
            .await
            .map_err(db_error)?
            .ok_or_else(|| not_found("Track"))?;
        Ok(())
    }
}

fn db_error(e: sqlx::Error) -> ServiceError {
    ServiceError::failed(format!("Database error: {e}"))
}

fn not_found(entity: &str) -> ServiceError {
    ServiceError::Status {
        status: 404,
        body: serde_json::json!({ "error": format!("{entity} not found") }).to_string(),
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Composes audio and stores it, falling back to an inline data URL.
pub struct ProviderAudio {
    music: Arc<MusicClient>,
    storage: Arc<StorageClient>,
}

impl ProviderAudio {
    pub fn new(music: Arc<MusicClient>, storage: Arc<StorageClient>) -> Self {
        Self { music, storage }
    }
}

#[async_trait]
impl AudioGenerator for ProviderAudio {
    async fn generate_audio(&self, request: &AudioRequest) -> Result<String, ServiceError> {
        let bytes = self
            .music
            .compose(&request.prompt, request.duration_secs, request.instrumental)
            .await?;
        Ok(self
            .storage
            .store_or_inline(StorageBucket::Audio, bytes, AUDIO_CONTENT_TYPE, Some("mp3"))
            .await)
    }
}

/// Generates images and stores them, falling back to an inline data URL.
pub struct ProviderImages {
    images: Arc<ImageClient>,
    storage: Arc<StorageClient>,
}

impl ProviderImages {
    pub fn new(images: Arc<ImageClient>, storage: Arc<StorageClient>) -> Self {
        Self { images, storage }
    }
}

#[async_trait]
impl ImageGenerator for ProviderImages {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, ServiceError> {
        let image = self
            .images
            .generate(
                &request.prompt,
                request.purpose,
                request.genre.as_deref(),
                request.mood.as_deref(),
            )
            .await?;
        let extension = image_extension(&image.mime_type);
        Ok(self
            .storage
            .store_or_inline(StorageBucket::Images, image.bytes, &image.mime_type, Some(extension))
            .await)
    }
}

fn image_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}
