//! The generation state machine.
//!
//! Lifecycle: `idle -> generating -> completed | error`. One run is active
//! per [`Orchestrator`]; starting another cancels the previous run's
//! [`CancellationToken`]. A cancelled run stops at its next checkpoint,
//! makes no further persistence writes and can no longer touch the
//! published [`GenerationSnapshot`].
//!
//! Failure handling per step:
//!
//! - playlist creation failure ends the run with `error`
//! - audio failure marks that track `error` and moves on to the next track
//! - image failure (cover or thumbnail) is logged and leaves the URL unset
//! - status writes are retried, then logged; they never abort the run

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use hyde_core::error::ServiceError;
use hyde_core::generation::{GenerationRequest, TRACK_DURATION_SECS};
use hyde_core::playlist::{aggregate_status, Playlist};
use hyde_core::retry::{execute_with_retry, RetryPolicy};
use hyde_core::status::{GenerationStatus, PlaylistStatus, TrackStatus};
use hyde_core::types::DbId;
use hyde_db::models::playlist::UpdatePlaylist;
use hyde_db::models::track::UpdateTrack;
use hyde_events::{names, EventBus, GenerationEvent};
use hyde_providers::ImagePurpose;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::collaborators::{AudioRequest, Collaborators, ImageRequest};
use crate::snapshot::{GenerationData, GenerationSnapshot};

// ---------------------------------------------------------------------------
// Retry budgets
// ---------------------------------------------------------------------------

/// Retry policy per kind of collaborator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicies {
    /// Playlist and track writes.
    pub persistence: RetryPolicy,
    pub audio: RetryPolicy,
    /// Cover and thumbnail generation.
    pub images: RetryPolicy,
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            persistence: RetryPolicy::persistence(),
            audio: RetryPolicy::audio(),
            images: RetryPolicy::persistence(),
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Owns the generation state for one session owner.
///
/// Must be used from within a Tokio runtime: runs are spawned as tasks.
pub struct Orchestrator {
    owner_id: Option<DbId>,
    collaborators: Collaborators,
    policies: RetryPolicies,
    events: Arc<EventBus>,
    state: Arc<watch::Sender<GenerationSnapshot>>,
    active: Mutex<Option<CancellationToken>>,
    next_run_id: AtomicU64,
}

impl Orchestrator {
    pub fn new(
        owner_id: Option<DbId>,
        collaborators: Collaborators,
        events: Arc<EventBus>,
    ) -> Self {
        let (state, _) = watch::channel(GenerationSnapshot::default());
        Self {
            owner_id,
            collaborators,
            policies: RetryPolicies::default(),
            events,
            state: Arc::new(state),
            active: Mutex::new(None),
            next_run_id: AtomicU64::new(0),
        }
    }

    pub fn with_retry_policies(mut self, policies: RetryPolicies) -> Self {
        self.policies = policies;
        self
    }

    pub fn owner_id(&self) -> Option<DbId> {
        self.owner_id
    }

    /// Start a new run, cancelling the one in flight.
    ///
    /// Returns `None` without touching any state when the prompt is blank.
    /// The returned handle completes when the run finishes or notices it
    /// was cancelled; the cover image task is not part of it.
    pub fn start_generation(&self, request: GenerationRequest) -> Option<JoinHandle<()>> {
        let request = request.normalized();
        if request.is_blank() {
            tracing::debug!(owner_id = ?self.owner_id, "Ignoring generation with blank prompt");
            return None;
        }

        let cancel = CancellationToken::new();
        if let Some(previous) = self.lock_active().replace(cancel.clone()) {
            previous.cancel();
        }
        let run_id = self.next_run_id.fetch_add(1, Ordering::Relaxed) + 1;

        self.state.send_modify(|s| {
            s.is_dismissed = false;
            s.last_error = None;
        });

        let run = Run {
            owner_id: self.owner_id,
            request,
            cancel,
            collaborators: self.collaborators.clone(),
            policies: self.policies,
            events: Arc::clone(&self.events),
            state: Arc::clone(&self.state),
        };
        let span = tracing::info_span!("generation", run_id, owner_id = ?self.owner_id);
        Some(tokio::spawn(run.execute().instrument(span)))
    }

    /// Replace the playlist of the current generation, if any.
    pub fn update_playlist(&self, playlist: Playlist) {
        self.state.send_modify(|s| {
            if let Some(generation) = s.generation.as_mut() {
                generation.playlist = playlist;
            }
        });
    }

    /// Cancel the active run and forget all state.
    pub fn clear_generation(&self) {
        if let Some(active) = self.lock_active().take() {
            active.cancel();
        }
        self.state.send_modify(|s| *s = GenerationSnapshot::default());
    }

    /// Hide the generation from the presenter. The run keeps going.
    pub fn dismiss_generation(&self) {
        self.state.send_modify(|s| {
            s.is_dismissed = true;
            s.is_expanded = false;
        });
    }

    pub fn set_expanded(&self, expanded: bool) {
        self.state.send_modify(|s| s.is_expanded = expanded);
    }

    pub fn snapshot(&self) -> GenerationSnapshot {
        self.state.borrow().clone()
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<GenerationSnapshot> {
        self.state.subscribe()
    }

    pub fn is_generating(&self) -> bool {
        self.state.borrow().is_generating()
    }

    /// Number of open snapshot receivers.
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    /// True when nothing observes this orchestrator, no run is in flight and
    /// the last generation (if any) finished at or before `cutoff`.
    pub fn is_evictable(&self, cutoff: DateTime<Utc>) -> bool {
        if self.subscriber_count() > 0 || self.has_live_run() {
            return false;
        }
        self.state
            .borrow()
            .generation
            .as_ref()
            .map_or(true, |g| g.completed_at.map_or(true, |t| t <= cutoff))
    }

    /// A run or its cover task still holds the snapshot sender.
    fn has_live_run(&self) -> bool {
        let active = self
            .lock_active()
            .as_ref()
            .is_some_and(|t| !t.is_cancelled());
        active && Arc::strong_count(&self.state) > 1
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        let active = self
            .active
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = active.take() {
            token.cancel();
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// The run's token fired; stop without further side effects.
#[derive(Debug)]
struct Cancelled;

/// One generation run. Cloned into the detached cover task.
#[derive(Clone)]
struct Run {
    owner_id: Option<DbId>,
    request: GenerationRequest,
    cancel: CancellationToken,
    collaborators: Collaborators,
    policies: RetryPolicies,
    events: Arc<EventBus>,
    state: Arc<watch::Sender<GenerationSnapshot>>,
}

impl Run {
    async fn execute(self) {
        if self.run().await.is_err() {
            tracing::info!("Generation superseded, stopping");
        }
    }

    async fn run(&self) -> Result<(), Cancelled> {
        let started_at = Utc::now();
        let draft = self.request.playlist_draft(self.owner_id);
        let drafts = self.request.track_drafts();

        let created = self
            .guarded(self.collaborators.store.create_with_tracks(&draft, &drafts))
            .await?;
        let mut playlist = match created {
            Ok(playlist) => playlist,
            Err(e) => {
                self.fail_creation(&e);
                return Ok(());
            }
        };
        playlist.tracks.sort_by_key(|t| t.track_order);

        tracing::info!(
            playlist_id = playlist.id,
            track_count = playlist.tracks.len(),
            "Playlist created, generating tracks",
        );

        let generation = GenerationData {
            playlist: playlist.clone(),
            mode: self.request.mode,
            status: GenerationStatus::Generating,
            started_at,
            completed_at: None,
        };
        self.publish(|s| {
            s.generation = Some(generation);
            s.last_error = None;
        });
        self.emit(
            GenerationEvent::new(names::GENERATION_STARTED)
                .with_playlist(playlist.id)
                .with_payload(serde_json::json!({
                    "name": playlist.name,
                    "mode": self.request.mode,
                    "track_count": playlist.tracks.len(),
                })),
        );

        self.spawn_cover(playlist.id);

        for index in 0..playlist.tracks.len() {
            self.ensure_active()?;
            self.generate_track(&mut playlist, index).await?;
        }

        self.complete(&playlist).await
    }

    // ---- per-track steps ----

    async fn generate_track(&self, playlist: &mut Playlist, index: usize) -> Result<(), Cancelled> {
        let track_id = playlist.tracks[index].id;

        playlist.tracks[index].status = TrackStatus::Generating;
        self.publish_track(playlist, index);
        self.emit(
            GenerationEvent::new(names::TRACK_GENERATING)
                .with_playlist(playlist.id)
                .with_track(track_id)
                .with_payload(serde_json::json!({ "track_order": index })),
        );

        let generating = UpdateTrack::status(TrackStatus::Generating);
        if let Err(e) = self
            .persist_track(track_id, &generating, "mark track generating")
            .await?
        {
            tracing::warn!(track_id, error = %e, "Failed to persist generating status");
        }

        let prompt = self.request.track_prompt(index);
        let (audio, image_url) = self
            .guarded(async {
                tokio::join!(
                    self.generate_audio(&prompt),
                    self.generate_image(&prompt, ImagePurpose::Thumbnail),
                )
            })
            .await?;

        let audio_url = match audio {
            Ok(audio_url) => audio_url,
            Err(e) => return self.fail_track(playlist, index, &e).await,
        };

        let ready = UpdateTrack::ready(audio_url.clone(), image_url.clone());
        if let Err(e) = self.persist_track(track_id, &ready, "mark track ready").await? {
            return self.fail_track(playlist, index, &e).await;
        }

        let has_image = image_url.is_some();
        let track = &mut playlist.tracks[index];
        track.audio_url = Some(audio_url);
        track.image_url = image_url;
        track.status = TrackStatus::Ready;
        track.error = None;
        self.publish_track(playlist, index);
        self.emit(
            GenerationEvent::new(names::TRACK_READY)
                .with_playlist(playlist.id)
                .with_track(track_id)
                .with_payload(serde_json::json!({
                    "track_order": index,
                    "has_image": has_image,
                })),
        );
        tracing::info!(track_id, track_index = index, "Track ready");
        Ok(())
    }

    async fn fail_track(
        &self,
        playlist: &mut Playlist,
        index: usize,
        error: &ServiceError,
    ) -> Result<(), Cancelled> {
        let track_id = playlist.tracks[index].id;
        let message = error.user_message();
        tracing::error!(track_id, track_index = index, error = %message, "Track generation failed");

        let failed = UpdateTrack::failed(message.clone());
        if let Err(e) = self.persist_track(track_id, &failed, "mark track failed").await? {
            tracing::warn!(track_id, error = %e, "Failed to persist track error");
        }

        let track = &mut playlist.tracks[index];
        track.status = TrackStatus::Error;
        track.error = Some(message.clone());
        self.publish_track(playlist, index);
        self.emit(
            GenerationEvent::new(names::TRACK_FAILED)
                .with_playlist(playlist.id)
                .with_track(track_id)
                .with_payload(serde_json::json!({
                    "track_order": index,
                    "error": message,
                })),
        );
        Ok(())
    }

    async fn complete(&self, playlist: &Playlist) -> Result<(), Cancelled> {
        let status = aggregate_status(&playlist.tracks);
        let ready = playlist.ready_count();
        let total = playlist.tracks.len();

        self.ensure_active()?;
        let store = &self.collaborators.store;
        let patch = UpdatePlaylist::status(status);
        let saved = self
            .guarded(execute_with_retry(
                &self.policies.persistence,
                "save playlist status",
                || store.update_playlist(playlist.id, &patch),
            ))
            .await?;
        if let Err(e) = saved {
            tracing::warn!(playlist_id = playlist.id, error = %e, "Failed to persist playlist status");
        }

        let lifecycle = if status == PlaylistStatus::Error {
            GenerationStatus::Error
        } else {
            GenerationStatus::Completed
        };
        let now = Utc::now();
        self.publish_generation(playlist.id, |g| {
            g.playlist.status = status;
            g.playlist.updated_at = now;
            g.status = lifecycle;
            g.completed_at = Some(now);
        });

        let event_type = match lifecycle {
            GenerationStatus::Error => names::GENERATION_FAILED,
            _ => names::GENERATION_COMPLETED,
        };
        self.emit(
            GenerationEvent::new(event_type)
                .with_playlist(playlist.id)
                .with_payload(serde_json::json!({
                    "status": status,
                    "ready": ready,
                    "total": total,
                })),
        );
        tracing::info!(
            playlist_id = playlist.id,
            status = %status,
            ready,
            total,
            "Generation finished",
        );
        Ok(())
    }

    fn fail_creation(&self, error: &ServiceError) {
        let message = error.user_message();
        tracing::error!(error = %message, "Failed to create playlist");

        let now = Utc::now();
        let stored = message.clone();
        self.publish(|s| {
            if let Some(generation) = s.generation.as_mut() {
                generation.status = GenerationStatus::Error;
                generation.completed_at = Some(now);
            }
            s.last_error = Some(stored);
        });
        self.emit(
            GenerationEvent::new(names::GENERATION_FAILED)
                .with_payload(serde_json::json!({ "error": message })),
        );
    }

    // ---- cover image ----

    /// Generate the cover in a detached task. Never fails the run.
    fn spawn_cover(&self, playlist_id: DbId) {
        let run = self.clone();
        tokio::spawn(
            async move {
                if run.generate_cover(playlist_id).await.is_err() {
                    tracing::debug!(playlist_id, "Cover generation abandoned");
                }
            }
            .in_current_span(),
        );
    }

    async fn generate_cover(&self, playlist_id: DbId) -> Result<(), Cancelled> {
        let Some(url) = self
            .guarded(self.generate_image(&self.request.prompt, ImagePurpose::Cover))
            .await?
        else {
            return Ok(());
        };

        self.ensure_active()?;
        let store = &self.collaborators.store;
        let patch = UpdatePlaylist::cover(url.clone());
        let saved = self
            .guarded(execute_with_retry(
                &self.policies.persistence,
                "save playlist cover",
                || store.update_playlist(playlist_id, &patch),
            ))
            .await?;
        if let Err(e) = saved {
            tracing::warn!(playlist_id, error = %e, "Failed to persist playlist cover");
        }

        self.publish_generation(playlist_id, |g| g.playlist.cover_image_url = Some(url));
        self.emit(GenerationEvent::new(names::GENERATION_COVER_READY).with_playlist(playlist_id));
        Ok(())
    }

    // ---- collaborator calls ----

    async fn generate_audio(&self, prompt: &str) -> Result<String, ServiceError> {
        let request = AudioRequest {
            prompt: prompt.to_string(),
            duration_secs: TRACK_DURATION_SECS,
            instrumental: true,
        };
        let audio = &self.collaborators.audio;
        execute_with_retry(&self.policies.audio, "generate audio", || {
            audio.generate_audio(&request)
        })
        .await
    }

    /// Best effort: failures are logged and yield `None`.
    async fn generate_image(&self, prompt: &str, purpose: ImagePurpose) -> Option<String> {
        let request = ImageRequest {
            prompt: prompt.to_string(),
            purpose,
            genre: self.request.genre.clone(),
            mood: self.request.mood.clone(),
        };
        let images = &self.collaborators.images;
        match execute_with_retry(&self.policies.images, "generate image", || {
            images.generate_image(&request)
        })
        .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(?purpose, error = %e, "Image generation failed");
                None
            }
        }
    }

    /// Write a track patch with retry. The outer result reports cancellation,
    /// the inner one the write itself.
    async fn persist_track(
        &self,
        track_id: DbId,
        patch: &UpdateTrack,
        label: &str,
    ) -> Result<Result<(), ServiceError>, Cancelled> {
        self.ensure_active()?;
        let store = &self.collaborators.store;
        self.guarded(execute_with_retry(&self.policies.persistence, label, || {
            store.update_track(track_id, patch)
        }))
        .await
    }

    // ---- cancellation and state ----

    fn ensure_active(&self) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Drive `fut` unless the run is cancelled first.
    async fn guarded<T>(&self, fut: impl Future<Output = T>) -> Result<T, Cancelled> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Cancelled),
            out = fut => Ok(out),
        }
    }

    /// Apply one atomic snapshot change, unless this run was cancelled.
    fn publish(&self, modify: impl FnOnce(&mut GenerationSnapshot)) {
        let cancel = &self.cancel;
        self.state.send_if_modified(|snapshot| {
            if cancel.is_cancelled() {
                return false;
            }
            modify(snapshot);
            true
        });
    }

    /// Modify the current generation if it still shows `playlist_id`.
    fn publish_generation(&self, playlist_id: DbId, modify: impl FnOnce(&mut GenerationData)) {
        self.publish(|s| {
            if let Some(generation) = s
                .generation
                .as_mut()
                .filter(|g| g.playlist.id == playlist_id)
            {
                modify(generation);
            }
        });
    }

    fn publish_track(&self, playlist: &Playlist, index: usize) {
        let track = playlist.tracks[index].clone();
        self.publish_generation(playlist.id, |g| {
            if let Some(slot) = g.playlist.tracks.iter_mut().find(|t| t.id == track.id) {
                *slot = track;
            }
        });
    }

    fn emit(&self, event: GenerationEvent) {
        if !self.cancel.is_cancelled() {
            self.events.publish(event.with_owner(self.owner_id));
        }
    }
}
