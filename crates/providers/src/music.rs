//! Text-to-music client for the ElevenLabs compose endpoint.

use hyde_core::generation::clamp_duration;
use serde::Serialize;

use crate::error::ProviderError;
use crate::http;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

/// Appended to the prompt when vocals are not wanted.
pub const INSTRUMENTAL_SUFFIX: &str = " Instrumental only, no vocals.";

/// Content type of composed audio.
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Message reported for a `bad_prompt` rejection.
pub const BAD_PROMPT_MESSAGE: &str = "Prompt contains copyrighted material";

#[derive(Debug, Serialize)]
struct ComposeRequest<'a> {
    prompt: &'a str,
    music_length_ms: u32,
}

/// HTTP client for music composition.
pub struct MusicClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl MusicClient {
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

    /// Compose a track and return the MP3 bytes.
    ///
    /// `duration_secs` is clamped to the range the service accepts. A
    /// `bad_prompt` rejection is returned as
    /// [`ProviderError::ContentPolicy`] with the service's suggested prompt.
    pub async fn compose(
        &self,
        prompt: &str,
        duration_secs: i32,
        instrumental: bool,
    ) -> Result<Vec<u8>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("ELEVENLABS_API_KEY"))?;

        let prompt = music_prompt(prompt, instrumental);
        let body = ComposeRequest {
            prompt: &prompt,
            music_length_ms: duration_ms(duration_secs),
        };

        tracing::debug!(
            duration_ms = body.music_length_ms,
            prompt_len = prompt.len(),
            "Composing track",
        );

        let response = self
            .client
            .post(format!("{}/v1/music", self.base_url))
            .header("xi-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        http::read_bytes(response).await.map_err(detect_content_policy)
    }
}

/// Final prompt sent to the service.
pub fn music_prompt(prompt: &str, instrumental: bool) -> String {
    if instrumental {
        format!("{prompt}{INSTRUMENTAL_SUFFIX}")
    } else {
        prompt.to_string()
    }
}

/// Clamped duration in milliseconds.
pub fn duration_ms(duration_secs: i32) -> u32 {
    clamp_duration(duration_secs).unsigned_abs() * 1000
}

fn detect_content_policy(err: ProviderError) -> ProviderError {
    match err {
        ProviderError::Api { status, body } if (400..500).contains(&status) => {
            match parse_bad_prompt(&body) {
                Some((message, suggestion)) => ProviderError::ContentPolicy {
                    message,
                    suggestion,
                },
                None => ProviderError::Api { status, body },
            }
        }
        other => other,
    }
}

/// Extract `(message, prompt_suggestion)` from a `bad_prompt` error body:
///
/// ```json
/// {"detail": {"status": "bad_prompt", "data": {"prompt_suggestion": "..."}}}
/// ```
pub fn parse_bad_prompt(body: &str) -> Option<(String, Option<String>)> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?;
    if detail.get("status").and_then(|s| s.as_str()) != Some("bad_prompt") {
        return None;
    }
    let message = BAD_PROMPT_MESSAGE.to_string();
    let suggestion = detail
        .pointer("/data/prompt_suggestion")
        .and_then(|s| s.as_str())
        .map(str::to_string);
    Some((message, suggestion))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn instrumental_suffix_is_appended() {
        assert_eq!(
            music_prompt("rainy jazz", true),
            "rainy jazz Instrumental only, no vocals."
        );
        assert_eq!(music_prompt("rainy jazz", false), "rainy jazz");
    }

    #[test]
    fn duration_is_clamped_and_converted() {
        assert_eq!(duration_ms(60), 60_000);
        assert_eq!(duration_ms(1), 10_000);
        assert_eq!(duration_ms(1000), 300_000);
    }

    #[test]
    fn bad_prompt_body_carries_suggestion() {
        let body = r#"{"detail":{"status":"bad_prompt","data":{"prompt_suggestion":"an upbeat pop song"}}}"#;
        let (message, suggestion) = parse_bad_prompt(body).expect("should parse");
        assert_eq!(message, BAD_PROMPT_MESSAGE);
        assert_eq!(suggestion.as_deref(), Some("an upbeat pop song"));
    }

    #[test]
    fn other_client_errors_stay_api_errors() {
        let err = detect_content_policy(ProviderError::Api {
            status: 401,
            body: r#"{"detail":{"status":"invalid_api_key"}}"#.into(),
        });
        assert_matches!(err, ProviderError::Api { status: 401, .. });
    }

    #[test]
    fn bad_prompt_becomes_content_policy() {
        let err = detect_content_policy(ProviderError::Api {
            status: 400,
            body: r#"{"detail":{"status":"bad_prompt"}}"#.into(),
        });
        assert_matches!(
            err,
            ProviderError::ContentPolicy { message, suggestion: None } if message == BAD_PROMPT_MESSAGE
        );
    }

    #[tokio::test]
    async fn compose_without_key_is_not_configured() {
        let client = MusicClient::new(reqwest::Client::new(), None, DEFAULT_BASE_URL.into());
        assert!(!client.is_configured());
        let err = client.compose("x", 60, true).await.unwrap_err();
        assert_matches!(err, ProviderError::NotConfigured(_));
    }
}
