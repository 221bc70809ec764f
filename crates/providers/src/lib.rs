//! HTTP clients for the third-party services behind track generation.
//!
//! - [`MusicClient`]: text-to-music composition.
//! - [`ImageClient`]: cover art and thumbnail generation.
//! - [`StorageClient`]: public object storage with an inline `data:` URL
//!   fallback.

pub mod error;
mod http;
pub mod image;
pub mod music;
pub mod storage;

pub use error::ProviderError;
pub use image::{GeneratedImage, ImageClient, ImagePurpose};
pub use music::MusicClient;
pub use storage::{StorageBucket, StorageClient};
