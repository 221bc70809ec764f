//! Handlers for the `/playlists` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use hyde_core::error::CoreError;
use hyde_core::generation::GenerationRequest;
use hyde_core::playlist::Playlist;
use hyde_core::types::DbId;
use hyde_db::models::playlist::UpdatePlaylist;
use hyde_db::repositories::{clamp_limit, PlaylistRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::session::MaybeSessionOwner;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

/// GET /api/v1/playlists
///
/// With a session cookie only the owner's playlists are returned.
pub async fn list(
    State(state): State<AppState>,
    owner: MaybeSessionOwner,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<Playlist>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let rows = PlaylistRepo::list(&state.pool, owner.user_id(), limit).await?;
    let playlists = rows
        .into_iter()
        .map(Playlist::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(DataResponse::new(playlists)))
}

/// POST /api/v1/playlists
///
/// Creates the playlist and its pending tracks in one transaction without
/// generating anything.
pub async fn create(
    State(state): State<AppState>,
    owner: MaybeSessionOwner,
    Json(input): Json<GenerationRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Playlist>>)> {
    let request = input.normalized();
    request.check()?;

    let row = PlaylistRepo::create_with_tracks(
        &state.pool,
        &request.playlist_draft(owner.user_id()),
        &request.track_drafts(),
    )
    .await?;
    let playlist = Playlist::try_from(row)?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(playlist))))
}

/// GET /api/v1/playlists/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Playlist>>> {
    let row = PlaylistRepo::find_with_tracks(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Playlist",
            id,
        }))?;
    Ok(Json(DataResponse::new(Playlist::try_from(row)?)))
}

/// PATCH /api/v1/playlists/{id}
///
/// When the playlist belongs to the caller's current generation the
/// refreshed copy replaces the one in the generation snapshot.
pub async fn update(
    State(state): State<AppState>,
    owner: MaybeSessionOwner,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePlaylist>,
) -> AppResult<Json<DataResponse<Playlist>>> {
    PlaylistRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Playlist",
            id,
        }))?;
    let row = PlaylistRepo::find_with_tracks(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Playlist",
            id,
        }))?;
    let playlist = Playlist::try_from(row)?;

    if let Some(orchestrator) = owner.user_id().and_then(|u| state.generations.get(u)) {
        let in_generation = orchestrator
            .snapshot()
            .generation
            .is_some_and(|g| g.playlist.id == id);
        if in_generation {
            orchestrator.update_playlist(playlist.clone());
        }
    }

    Ok(Json(DataResponse::new(playlist)))
}

/// DELETE /api/v1/playlists/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if PlaylistRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Playlist",
            id,
        }))
    }
}
