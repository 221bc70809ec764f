//! Public object storage client (Supabase storage REST API).
//!
//! When storage is not configured, or an upload fails, callers can fall back
//! to embedding the payload as a `data:` URL via
//! [`StorageClient::store_or_inline`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::http;

/// Cache lifetime sent with every upload, in seconds.
const CACHE_CONTROL_SECS: u32 = 3600;

/// Storage buckets the application writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBucket {
    Audio,
    Images,
}

impl StorageBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Images => "images",
        }
    }

    /// File extension used when the caller supplies none.
    pub fn default_extension(self) -> &'static str {
        match self {
            Self::Audio => "mp3",
            Self::Images => "png",
        }
    }
}

/// HTTP client for the storage service.
pub struct StorageClient {
    client: reqwest::Client,
    base_url: Option<String>,
    service_key: Option<String>,
}

impl StorageClient {
    pub fn new(
        client: reqwest::Client,
        base_url: Option<String>,
        service_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            service_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.service_key.is_some()
    }

    /// Upload `bytes` under a fresh unique name and return its public URL.
    pub async fn upload(
        &self,
        bucket: StorageBucket,
        bytes: Vec<u8>,
        content_type: &str,
        extension: Option<&str>,
    ) -> Result<String, ProviderError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or(ProviderError::NotConfigured("STORAGE_URL"))?;
        let key = self
            .service_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("STORAGE_SERVICE_KEY"))?;

        let path = object_path(extension.unwrap_or(bucket.default_extension()));
        let response = self
            .client
            .post(format!(
                "{base_url}/storage/v1/object/{}/{path}",
                bucket.as_str()
            ))
            .bearer_auth(key)
            .header("apikey", key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, format!("max-age={CACHE_CONTROL_SECS}"))
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        http::ensure_success(response).await?;

        Ok(public_url(base_url, bucket, &path))
    }

    /// Upload, or embed the payload as a `data:` URL when storage is
    /// unavailable. Never fails.
    pub async fn store_or_inline(
        &self,
        bucket: StorageBucket,
        bytes: Vec<u8>,
        content_type: &str,
        extension: Option<&str>,
    ) -> String {
        if !self.is_configured() {
            tracing::warn!(
                bucket = bucket.as_str(),
                "Storage not configured, returning inline data URL",
            );
            return data_url(content_type, &bytes);
        }

        let inline = data_url(content_type, &bytes);
        match self.upload(bucket, bytes, content_type, extension).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    bucket = bucket.as_str(),
                    error = %e,
                    "Storage upload failed, returning inline data URL",
                );
                inline
            }
        }
    }
}

/// `{unix_ms}-{6 random chars}.{extension}`
pub fn object_path(extension: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!(
        "{}-{suffix}.{extension}",
        chrono::Utc::now().timestamp_millis()
    )
}

pub fn public_url(base_url: &str, bucket: StorageBucket, path: &str) -> String {
    format!("{base_url}/storage/v1/object/public/{}/{path}", bucket.as_str())
}

pub fn data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", STANDARD.encode(bytes))
}

/// Decode a base64 payload, accepting an optional `data:...;base64,` prefix.
pub fn decode_base64_payload(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match data.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,").map_or(rest, |(_, b64)| b64),
        None => data,
    };
    STANDARD.decode(payload.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_encodes_payload() {
        assert_eq!(data_url("audio/mpeg", b"abc"), "data:audio/mpeg;base64,YWJj");
    }

    #[test]
    fn payload_prefix_is_stripped() {
        assert_eq!(
            decode_base64_payload("data:image/png;base64,YWJj").unwrap(),
            b"abc"
        );
        assert_eq!(decode_base64_payload("YWJj").unwrap(), b"abc");
        assert!(decode_base64_payload("***").is_err());
    }

    #[test]
    fn object_paths_are_unique_and_keep_extension() {
        let a = object_path("mp3");
        let b = object_path("mp3");
        assert!(a.ends_with(".mp3"));
        assert_ne!(a, b);
    }

    #[test]
    fn public_url_layout() {
        assert_eq!(
            public_url("https://x.supabase.co", StorageBucket::Images, "1-abc.png"),
            "https://x.supabase.co/storage/v1/object/public/images/1-abc.png"
        );
    }

    #[tokio::test]
    async fn unconfigured_storage_inlines() {
        let storage = StorageClient::new(reqwest::Client::new(), None, None);
        let url = storage
            .store_or_inline(StorageBucket::Audio, b"abc".to_vec(), "audio/mpeg", None)
            .await;
        assert_eq!(url, "data:audio/mpeg;base64,YWJj");
    }
}
