//! Route definitions for the `/playlists` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::playlists;
use crate::state::AppState;

/// Routes mounted at `/playlists`.
///
/// ```text
/// GET    /        -> list
/// POST   /        -> create
/// GET    /{id}    -> get_by_id
/// PATCH  /{id}    -> update
/// DELETE /{id}    -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(playlists::list).post(playlists::create))
        .route(
            "/{id}",
            get(playlists::get_by_id)
                .patch(playlists::update)
                .delete(playlists::delete),
        )
}
