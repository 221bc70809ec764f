//! In-memory collaborators for orchestrator tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hyde_core::error::ServiceError;
use hyde_core::generation::{PlaylistDraft, TrackDraft};
use hyde_core::playlist::{Playlist, Track};
use hyde_core::retry::RetryPolicy;
use hyde_core::status::TrackStatus;
use hyde_core::types::DbId;
use hyde_db::models::playlist::UpdatePlaylist;
use hyde_db::models::track::UpdateTrack;
use hyde_events::EventBus;
use hyde_pipeline::{
    AudioGenerator, AudioRequest, Collaborators, GenerationSnapshot, ImageGenerator,
    ImageRequest, Orchestrator, PlaylistStore, RetryPolicies,
};
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// A write the orchestrator made, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Playlist { id: DbId, patch: UpdatePlaylist },
    Track { id: DbId, patch: UpdateTrack },
}

#[derive(Default)]
struct StoreState {
    next_id: DbId,
    playlists: BTreeMap<DbId, Playlist>,
    writes: Vec<Write>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    fail_create: bool,
    fail_ready_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every `create_with_tracks` call fails.
    pub fn failing_create() -> Arc<Self> {
        Arc::new(Self {
            fail_create: true,
            ..Default::default()
        })
    }

    /// Writes that mark a track `ready` fail with a terminal error.
    pub fn failing_ready_writes() -> Arc<Self> {
        Arc::new(Self {
            fail_ready_writes: true,
            ..Default::default()
        })
    }

    pub fn playlists(&self) -> Vec<Playlist> {
        self.state.lock().unwrap().playlists.values().cloned().collect()
    }

    pub fn writes(&self) -> Vec<Write> {
        self.state.lock().unwrap().writes.clone()
    }

    fn next_id(state: &mut StoreState) -> DbId {
        state.next_id += 1;
        state.next_id
    }
}

#[async_trait]
impl PlaylistStore for MemoryStore {
    async fn create_with_tracks(
        &self,
        draft: &PlaylistDraft,
        tracks: &[TrackDraft],
    ) -> Result<Playlist, ServiceError> {
        if self.fail_create {
            return Err(ServiceError::Status {
                status: 400,
                body: r#"{"error":"Failed to create playlist"}"#.into(),
            });
        }

        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let playlist_id = Self::next_id(&mut state);
        let tracks = tracks
            .iter()
            .map(|t| Track {
                id: Self::next_id(&mut state),
                playlist_id,
                title: t.title.clone(),
                prompt: t.prompt.clone(),
                genre: t.genre.clone(),
                mood: t.mood.clone(),
                duration: t.duration,
                audio_url: None,
                image_url: None,
                status: t.status,
                error: None,
                track_order: t.track_order,
                created_at: now,
            })
            .collect();
        let playlist = Playlist {
            id: playlist_id,
            owner_id: draft.owner_id,
            name: draft.name.clone(),
            description: None,
            prompt: draft.prompt.clone(),
            genre: draft.genre.clone(),
            mood: draft.mood.clone(),
            cover_image_url: None,
            status: draft.status,
            created_at: now,
            updated_at: now,
            tracks,
        };
        state.playlists.insert(playlist_id, playlist.clone());
        Ok(playlist)
    }

    async fn update_playlist(&self, id: DbId, patch: &UpdatePlaylist) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(Write::Playlist {
            id,
            patch: patch.clone(),
        });
        let playlist = state
            .playlists
            .get_mut(&id)
            .ok_or_else(|| ServiceError::failed("Playlist not found"))?;
        if let Some(url) = &patch.cover_image_url {
            playlist.cover_image_url = Some(url.clone());
        }
        if let Some(status) = patch.status {
            playlist.status = status;
        }
        Ok(())
    }

    async fn update_track(&self, id: DbId, patch: &UpdateTrack) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(Write::Track {
            id,
            patch: patch.clone(),
        });
        if self.fail_ready_writes && patch.status == Some(TrackStatus::Ready) {
            return Err(ServiceError::Status {
                status: 409,
                body: r#"{"error":"Track is locked"}"#.into(),
            });
        }
        let track = state
            .playlists
            .values_mut()
            .flat_map(|p| p.tracks.iter_mut())
            .find(|t| t.id == id)
            .ok_or_else(|| ServiceError::failed("Track not found"))?;
        if let Some(url) = &patch.audio_url {
            track.audio_url = Some(url.clone());
        }
        if let Some(url) = &patch.image_url {
            track.image_url = Some(url.clone());
        }
        if let Some(status) = patch.status {
            track.status = status;
            if status != TrackStatus::Error {
                track.error = None;
            }
        }
        if let Some(error) = &patch.error {
            track.error = Some(error.clone());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

pub enum AudioOutcome {
    Ready,
    Fail(ServiceError),
    /// Never settles; signals `entered` first.
    Hang,
}

type AudioBehaviour = Box<dyn Fn(&AudioRequest) -> AudioOutcome + Send + Sync>;

pub struct FakeAudio {
    behaviour: AudioBehaviour,
    prompts: Mutex<Vec<String>>,
    pub entered: Notify,
}

impl FakeAudio {
    pub fn new(behaviour: impl Fn(&AudioRequest) -> AudioOutcome + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            behaviour: Box::new(behaviour),
            prompts: Mutex::new(Vec::new()),
            entered: Notify::new(),
        })
    }

    pub fn always_ready() -> Arc<Self> {
        Self::new(|_| AudioOutcome::Ready)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioGenerator for FakeAudio {
    async fn generate_audio(&self, request: &AudioRequest) -> Result<String, ServiceError> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(request.prompt.clone());
            prompts.len()
        };
        match (self.behaviour)(request) {
            AudioOutcome::Ready => Ok(format!("https://cdn.test/audio/{call}.mp3")),
            AudioOutcome::Fail(e) => Err(e),
            AudioOutcome::Hang => {
                self.entered.notify_one();
                std::future::pending().await
            }
        }
    }
}

/// A terminal rejection whose body carries a JSON `error` message.
pub fn rejected(message: &str) -> ServiceError {
    ServiceError::Status {
        status: 400,
        body: serde_json::json!({ "error": message }).to_string(),
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

pub struct FakeImages {
    fail: bool,
    requests: Mutex<Vec<ImageRequest>>,
}

impl FakeImages {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(ServiceError::Status {
                status: 502,
                body: "<!DOCTYPE html><html>Bad gateway</html>".into(),
            });
        }
        Ok(format!("https://cdn.test/images/{:?}.png", request.purpose))
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Retry budgets with the production attempt counts but no sleeping.
pub fn fast_policies() -> RetryPolicies {
    RetryPolicies {
        persistence: RetryPolicy::immediate(3),
        audio: RetryPolicy::immediate(2),
        images: RetryPolicy::immediate(3),
    }
}

pub fn collaborators(
    store: &Arc<MemoryStore>,
    audio: &Arc<FakeAudio>,
    images: &Arc<FakeImages>,
) -> Collaborators {
    Collaborators {
        store: Arc::clone(store) as Arc<dyn PlaylistStore>,
        audio: Arc::clone(audio) as Arc<dyn AudioGenerator>,
        images: Arc::clone(images) as Arc<dyn ImageGenerator>,
    }
}

pub fn orchestrator(
    store: &Arc<MemoryStore>,
    audio: &Arc<FakeAudio>,
    images: &Arc<FakeImages>,
    events: &Arc<EventBus>,
) -> Orchestrator {
    Orchestrator::new(Some(1), collaborators(store, audio, images), Arc::clone(events))
        .with_retry_policies(fast_policies())
}

/// Wait (bounded) until the published snapshot satisfies `predicate`.
pub async fn wait_for(
    orchestrator: &Orchestrator,
    predicate: impl FnMut(&GenerationSnapshot) -> bool,
) -> GenerationSnapshot {
    let mut rx = orchestrator.subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("orchestrator dropped");
    snapshot.clone()
}

/// Await a run handle, failing the test if it does not finish promptly.
pub async fn join(handle: tokio::task::JoinHandle<()>) {
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("run did not finish")
        .expect("run panicked");
}
