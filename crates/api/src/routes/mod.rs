pub mod generations;
pub mod health;
pub mod playlists;
pub mod tracks;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{discover, media, session};
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /session                          init (POST), current (GET)
///
/// /playlists                        list, create
/// /playlists/{id}                   get, patch, delete
/// /tracks/{id}                      get, patch, delete
///
/// /generate-track                   music proxy (POST)
/// /generate-image                   image proxy (POST)
/// /upload                           storage upload (POST)
/// /discover                         recent tracks + featured playlists
///
/// /generations                      start (POST, 202)
/// /generations/current              snapshot (GET), clear (DELETE)
/// /generations/current/stream       SSE snapshots
/// /generations/current/dismiss      dismiss (POST)
/// /generations/current/expanded     expand/collapse (PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(session::current).post(session::init))
        .nest("/playlists", playlists::router())
        .nest("/tracks", tracks::router())
        .route("/generate-track", post(media::generate_track))
        .route("/generate-image", post(media::generate_image))
        .route("/upload", post(media::upload))
        .route("/discover", get(discover::feed))
        .nest("/generations", generations::router())
}
