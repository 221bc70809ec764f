//! Route definitions for the `/generations` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::generations;
use crate::state::AppState;

/// Routes mounted at `/generations`.
///
/// ```text
/// POST   /                      -> start
/// GET    /current               -> current
/// DELETE /current               -> clear
/// GET    /current/stream        -> stream (SSE)
/// POST   /current/dismiss       -> dismiss
/// PUT    /current/expanded      -> set_expanded
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(generations::start))
        .route(
            "/current",
            get(generations::current).delete(generations::clear),
        )
        .route("/current/stream", get(generations::stream))
        .route("/current/dismiss", post(generations::dismiss))
        .route("/current/expanded", put(generations::set_expanded))
}
