//! Image generation client for the Imagen `predict` endpoint.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::http;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used for every request.
pub const IMAGE_MODEL: &str = "imagen-3.0-generate-002";

const STYLE_GUIDE: &str = "Digital art, vibrant neon colors, dark moody background with \
    purple and blue gradients, atmospheric lighting, modern aesthetic, album cover art style";

/// What the image is for. Selects the prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImagePurpose {
    #[serde(rename = "playlist_cover")]
    Cover,
    #[serde(rename = "track_thumbnail")]
    Thumbnail,
}

/// Decoded image returned by the service.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

/// HTTP client for image generation.
pub struct ImageClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl ImageClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate one square PNG for `prompt`.
    pub async fn generate(
        &self,
        prompt: &str,
        purpose: ImagePurpose,
        genre: Option<&str>,
        mood: Option<&str>,
    ) -> Result<GeneratedImage, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("GOOGLE_AI_API_KEY"))?;

        let body = serde_json::json!({
            "instances": [{ "prompt": build_image_prompt(prompt, purpose, genre, mood) }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "1:1",
                "outputOptions": { "mimeType": "image/png" },
            },
        });

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{IMAGE_MODEL}:predict",
                self.base_url
            ))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: PredictResponse = http::parse_response(response).await?;
        let prediction = parsed
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No image generated".into()))?;
        let encoded = prediction
            .bytes_base64_encoded
            .ok_or_else(|| ProviderError::InvalidResponse("Failed to get image data".into()))?;

        Ok(GeneratedImage {
            bytes: STANDARD.decode(encoded)?,
            mime_type: prediction.mime_type.unwrap_or_else(|| "image/png".into()),
        })
    }
}

/// Wrap the user prompt in the house art style for the given purpose.
pub fn build_image_prompt(
    prompt: &str,
    purpose: ImagePurpose,
    genre: Option<&str>,
    mood: Option<&str>,
) -> String {
    let mut context = Vec::new();
    if let Some(genre) = genre {
        context.push(format!("{genre} music inspired"));
    }
    if let Some(mood) = mood {
        context.push(format!("{mood} atmosphere"));
    }
    let context = if context.is_empty() {
        String::new()
    } else {
        format!(" {}.", context.join(", "))
    };

    match purpose {
        ImagePurpose::Cover => format!(
            "{STYLE_GUIDE}. A stunning album cover artwork representing: {prompt}.{context} \
             Artistic portrait or abstract visualization, cinematic quality, high detail."
        ),
        ImagePurpose::Thumbnail => format!(
            "{STYLE_GUIDE}. A small album thumbnail artwork for a track about: {prompt}.{context} \
             Artistic and evocative, suitable for music streaming app."
        ),
    }
}
