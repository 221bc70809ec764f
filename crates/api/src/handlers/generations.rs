//! Handlers for `/generations`: the session owner's orchestrated run.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, Stream, StreamExt};
use hyde_core::generation::GenerationRequest;
use hyde_core::status::GenerationStatus;
use hyde_core::types::DbId;
use hyde_pipeline::GenerationSnapshot;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;
use crate::middleware::session::SessionOwner;
use crate::response::DataResponse;
use crate::state::AppState;

/// Interval between SSE keep-alive comments.
const KEEP_ALIVE_SECS: u64 = 15;

#[derive(Debug, Serialize)]
pub struct Progress {
    pub ready: usize,
    pub total: usize,
}

/// A snapshot plus the values a presenter derives from it.
#[derive(Debug, Serialize)]
pub struct GenerationView {
    #[serde(flatten)]
    pub snapshot: GenerationSnapshot,
    pub status: GenerationStatus,
    pub is_generating: bool,
    pub is_visible: bool,
    pub progress: Option<Progress>,
    pub current_track_id: Option<DbId>,
}

impl From<GenerationSnapshot> for GenerationView {
    fn from(snapshot: GenerationSnapshot) -> Self {
        let progress = snapshot.generation.as_ref().map(|g| {
            let (ready, total) = g.progress();
            Progress { ready, total }
        });
        let current_track_id = snapshot
            .generation
            .as_ref()
            .and_then(|g| g.playlist.current_track())
            .map(|t| t.id);

        Self {
            status: snapshot.status(),
            is_generating: snapshot.is_generating(),
            is_visible: snapshot.is_visible(),
            progress,
            current_track_id,
            snapshot,
        }
    }
}

type ViewResponse = Json<DataResponse<GenerationView>>;

fn view(snapshot: GenerationSnapshot) -> ViewResponse {
    Json(DataResponse::new(GenerationView::from(snapshot)))
}

/// POST /api/v1/generations
///
/// Starts a run for the session owner, cancelling any run in flight, and
/// answers 202 with the snapshot at that moment.
pub async fn start(
    State(state): State<AppState>,
    owner: SessionOwner,
    Json(input): Json<GenerationRequest>,
) -> AppResult<(StatusCode, ViewResponse)> {
    let request = input.normalized();
    request.check()?;

    tracing::info!(
        user_id = owner.user_id,
        mode = ?request.mode,
        "Starting generation",
    );

    let orchestrator = state.generations.for_owner(owner.user_id);
    // The run is detached; its progress is observed through the snapshot.
    let _ = orchestrator.start_generation(request);

    Ok((StatusCode::ACCEPTED, view(orchestrator.snapshot())))
}

/// GET /api/v1/generations/current
pub async fn current(State(state): State<AppState>, owner: SessionOwner) -> ViewResponse {
    let snapshot = state
        .generations
        .get(owner.user_id)
        .map(|o| o.snapshot())
        .unwrap_or_default();
    view(snapshot)
}

/// GET /api/v1/generations/current/stream
///
/// Server-sent `snapshot` events: the current value first, then one per
/// published change. Without an orchestrator the idle snapshot is sent once
/// and the stream ends; the client reconnects. Every stream ends on server
/// shutdown.
pub async fn stream(
    State(state): State<AppState>,
    owner: SessionOwner,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let snapshots = match state.generations.get(owner.user_id) {
        Some(orchestrator) => WatchStream::new(orchestrator.subscribe()).boxed(),
        None => stream::once(async { GenerationSnapshot::default() }).boxed(),
    };
    tracing::debug!(user_id = owner.user_id, "Generation stream opened");

    Sse::new(snapshot_events(snapshots, state.shutdown.clone())).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}

/// Map snapshots to SSE events until `shutdown` fires.
fn snapshot_events(
    snapshots: impl Stream<Item = GenerationSnapshot>,
    shutdown: CancellationToken,
) -> impl Stream<Item = Result<Event, axum::Error>> {
    snapshots
        .take_until(shutdown.cancelled_owned())
        .map(|snapshot| {
            Event::default()
                .event("snapshot")
                .json_data(GenerationView::from(snapshot))
        })
}

/// POST /api/v1/generations/current/dismiss
pub async fn dismiss(State(state): State<AppState>, owner: SessionOwner) -> ViewResponse {
    match state.generations.get(owner.user_id) {
        Some(orchestrator) => {
            orchestrator.dismiss_generation();
            view(orchestrator.snapshot())
        }
        None => view(GenerationSnapshot::default()),
    }
}

#[derive(Debug, Deserialize)]
pub struct ExpandedInput {
    pub expanded: bool,
}

/// PUT /api/v1/generations/current/expanded
pub async fn set_expanded(
    State(state): State<AppState>,
    owner: SessionOwner,
    Json(input): Json<ExpandedInput>,
) -> ViewResponse {
    match state.generations.get(owner.user_id) {
        Some(orchestrator) => {
            orchestrator.set_expanded(input.expanded);
            view(orchestrator.snapshot())
        }
        None => view(GenerationSnapshot::default()),
    }
}

/// DELETE /api/v1/generations/current
///
/// Cancels any run in flight, forgets its state and releases the
/// orchestrator unless a stream is still open.
pub async fn clear(State(state): State<AppState>, owner: SessionOwner) -> StatusCode {
    if let Some(orchestrator) = state.generations.get(owner.user_id) {
        orchestrator.clear_generation();
    }
    state.generations.release(owner.user_id);
    StatusCode::NO_CONTENT
}
