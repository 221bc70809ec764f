use std::sync::Arc;

use hyde_events::EventBus;
use hyde_pipeline::adapters::production_collaborators;
use hyde_pipeline::OrchestratorRegistry;
use hyde_providers::{ImageClient, MusicClient, StorageClient};
use tokio_util::sync::CancellationToken;

use crate::config::{ProviderConfig, ServerConfig};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: hyde_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Generation lifecycle events.
    pub event_bus: Arc<EventBus>,
    /// One generation orchestrator per session owner.
    pub generations: Arc<OrchestratorRegistry>,
    pub music: Arc<MusicClient>,
    pub images: Arc<ImageClient>,
    pub storage: Arc<StorageClient>,
    /// Cancelled when the server starts shutting down; ends long-lived
    /// responses such as snapshot streams.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build the provider clients and the orchestrator registry around
    /// one shared `reqwest` client.
    pub fn new(
        pool: hyde_db::DbPool,
        config: ServerConfig,
        providers: &ProviderConfig,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let http = reqwest::Client::new();

        let music = Arc::new(MusicClient::new(
            http.clone(),
            providers.elevenlabs_api_key.clone(),
            providers.elevenlabs_base_url.clone(),
        ));
        let images = Arc::new(ImageClient::new(
            http.clone(),
            providers.google_ai_api_key.clone(),
            providers.imagen_base_url.clone(),
        ));
        let storage = Arc::new(StorageClient::new(
            http,
            providers.storage_url.clone(),
            providers.storage_service_key.clone(),
        ));

        let collaborators = production_collaborators(
            pool.clone(),
            Arc::clone(&music),
            Arc::clone(&images),
            Arc::clone(&storage),
        );
        let generations = Arc::new(OrchestratorRegistry::new(
            collaborators,
            Arc::clone(&event_bus),
        ));

        Self {
            pool,
            config: Arc::new(config),
            event_bus,
            generations,
            music,
            images,
            storage,
            shutdown: CancellationToken::new(),
        }
    }
}
