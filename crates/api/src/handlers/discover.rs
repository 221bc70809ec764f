//! Public discover feed.

use axum::extract::State;
use axum::Json;
use hyde_core::playlist::{Playlist, Track};
use hyde_db::repositories::{PlaylistRepo, TrackRepo};
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

const RECENT_TRACKS: i64 = 20;
const FEATURED_PLAYLISTS: i64 = 12;

#[derive(Debug, Serialize)]
pub struct DiscoverFeed {
    pub recent_tracks: Vec<Track>,
    pub featured_playlists: Vec<Playlist>,
}

/// GET /api/v1/discover
///
/// Recent playable tracks and featured playlists, queried concurrently.
pub async fn feed(State(state): State<AppState>) -> AppResult<Json<DataResponse<DiscoverFeed>>> {
    let (tracks, playlists) = tokio::join!(
        TrackRepo::list_recent_ready(&state.pool, RECENT_TRACKS),
        PlaylistRepo::list_featured(&state.pool, FEATURED_PLAYLISTS),
    );

    let recent_tracks = tracks?
        .into_iter()
        .map(Track::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let featured_playlists = playlists?
        .into_iter()
        .map(Playlist::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse::new(DiscoverFeed {
        recent_tracks,
        featured_playlists,
    })))
}
