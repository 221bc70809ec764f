use axum::routing::get;
use axum::Router;

use crate::handlers::tracks;
use crate::state::AppState;

/// Routes mounted at `/tracks`.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        get(tracks::get_by_id)
            .patch(tracks::update)
            .delete(tracks::delete),
    )
}
