//! Thin proxies over the music, image and storage services.
//!
//! These endpoints generate or store a single asset on demand; the
//! orchestrated multi-track flow lives under `/generations`.

use axum::extract::State;
use axum::Json;
use hyde_core::error::CoreError;
use hyde_core::generation::{
    MAX_TRACK_DURATION_SECS, MIN_TRACK_DURATION_SECS, TRACK_DURATION_SECS,
};
use hyde_providers::music::{music_prompt, AUDIO_CONTENT_TYPE};
use hyde_providers::storage::decode_base64_payload;
use hyde_providers::{ImagePurpose, StorageBucket};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn default_duration() -> i32 {
    TRACK_DURATION_SECS
}

fn default_instrumental() -> bool {
    true
}

fn require_prompt(prompt: &str) -> AppResult<&str> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Prompt is required".into(),
        )));
    }
    Ok(prompt)
}

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GenerateTrackRequest {
    pub prompt: String,
    #[serde(default = "default_duration")]
    pub duration: i32,
    #[serde(default = "default_instrumental")]
    pub instrumental: bool,
}

#[derive(Debug, Serialize)]
pub struct GeneratedTrack {
    pub audio_url: String,
    pub duration: i32,
    /// The prompt actually sent to the music service.
    pub prompt: String,
}

/// POST /api/v1/generate-track
///
/// A `bad_prompt` rejection is answered with 400 `CONTENT_POLICY` and the
/// service's suggested prompt.
pub async fn generate_track(
    State(state): State<AppState>,
    Json(input): Json<GenerateTrackRequest>,
) -> AppResult<Json<DataResponse<GeneratedTrack>>> {
    let prompt = require_prompt(&input.prompt)?;
    let duration = input
        .duration
        .clamp(MIN_TRACK_DURATION_SECS, MAX_TRACK_DURATION_SECS);

    let bytes = state
        .music
        .compose(prompt, duration, input.instrumental)
        .await?;
    let audio_url = state
        .storage
        .store_or_inline(StorageBucket::Audio, bytes, AUDIO_CONTENT_TYPE, Some("mp3"))
        .await;

    Ok(Json(DataResponse::new(GeneratedTrack {
        audio_url,
        duration,
        prompt: music_prompt(prompt, input.instrumental),
    })))
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
    #[serde(rename = "type")]
    pub purpose: ImagePurpose,
    pub genre: Option<String>,
    pub mood: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedImageUrl {
    pub image_url: String,
}

/// POST /api/v1/generate-image
pub async fn generate_image(
    State(state): State<AppState>,
    Json(input): Json<GenerateImageRequest>,
) -> AppResult<Json<DataResponse<GeneratedImageUrl>>> {
    let prompt = require_prompt(&input.prompt)?;

    let image = state
        .images
        .generate(
            prompt,
            input.purpose,
            input.genre.as_deref(),
            input.mood.as_deref(),
        )
        .await?;
    let image_url = state
        .storage
        .store_or_inline(StorageBucket::Images, image.bytes, &image.mime_type, None)
        .await;

    Ok(Json(DataResponse::new(GeneratedImageUrl { image_url })))
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// Base64 payload, optionally as a full `data:` URL.
    pub data: String,
    pub file_name: String,
    pub bucket: StorageBucket,
    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub url: String,
}

/// POST /api/v1/upload
///
/// Unlike the generators this does not fall back to an inline URL: an
/// upload that cannot be stored is an error.
pub async fn upload(
    State(state): State<AppState>,
    Json(input): Json<UploadRequest>,
) -> AppResult<Json<DataResponse<UploadedFile>>> {
    if input.data.is_empty() || input.file_name.is_empty() {
        return Err(AppError::BadRequest(
            "Missing required fields: data, file_name".into(),
        ));
    }

    let bytes = decode_base64_payload(&input.data)
        .map_err(|e| AppError::BadRequest(format!("Invalid base64 payload: {e}")))?;
    let extension = file_extension(&input.file_name);

    let url = state
        .storage
        .upload(input.bucket, bytes, &input.content_type, extension)
        .await?;

    tracing::debug!(bucket = input.bucket.as_str(), %url, "File uploaded");
    Ok(Json(DataResponse::new(UploadedFile { url })))
}

/// Extension after the last `.`, if the name has one.
fn file_extension(file_name: &str) -> Option<&str> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_from_file_name() {
        assert_eq!(file_extension("song.final.mp3"), Some("mp3"));
        assert_eq!(file_extension("cover"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn generate_track_defaults() {
        let input: GenerateTrackRequest =
            serde_json::from_str(r#"{"prompt":"rainy cafe"}"#).unwrap();
        assert_eq!(input.duration, 60);
        assert!(input.instrumental);
    }

    #[test]
    fn image_request_reads_type_field() {
        let input: GenerateImageRequest =
            serde_json::from_str(r#"{"prompt":"x","type":"track_thumbnail"}"#).unwrap();
        assert_eq!(input.purpose, ImagePurpose::Thumbnail);
    }
}
