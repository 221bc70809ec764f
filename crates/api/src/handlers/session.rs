//! Handlers for the anonymous `/session` resource.

use axum::extract::State;
use axum::http::header::{SET_COOKIE, USER_AGENT};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hyde_core::error::CoreError;
use hyde_core::session::{client_ip, generate_session_token, hash_ip};
use hyde_core::types::{DbId, Timestamp};
use hyde_db::models::session::{CreateSession, Session};
use hyde_db::models::user::User;
use hyde_db::repositories::{SessionRepo, UserRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::session::{session_cookie, session_token};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: DbId,
    pub created_at: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct SessionDetails {
    pub id: DbId,
    pub created_at: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user: SessionUser,
    pub session: SessionDetails,
    pub is_new_session: bool,
}

impl SessionInfo {
    fn new(user: &User, session: &Session, is_new_session: bool) -> Self {
        Self {
            user: SessionUser {
                id: user.id,
                created_at: user.created_at,
            },
            session: SessionDetails {
                id: session.id,
                created_at: session.created_at,
            },
            is_new_session,
        }
    }
}

/// POST /api/v1/session
///
/// Reuses a valid session cookie, otherwise finds or creates the user for
/// the hashed client IP and issues a fresh token. Always (re)sets the
/// cookie.
pub async fn init(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = session_token(&headers) {
        if let Some(found) = SessionRepo::find_with_user(&state.pool, token).await? {
            SessionRepo::touch(&state.pool, found.session.id).await?;
            let info = SessionInfo::new(&found.user, &found.session, false);
            return with_cookie(&state, token, info);
        }
        tracing::debug!("Unknown session token, issuing a new session");
    }

    let ip = client_ip(|name| headers.get(name).and_then(|v| v.to_str().ok()));
    let ip_hash = hash_ip(&state.config.session.secret, &ip);
    let user = UserRepo::get_or_create_by_ip_hash(&state.pool, &ip_hash).await?;

    let token = generate_session_token();
    let session = SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            session_token: token.clone(),
            user_agent: headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, session_id = session.id, "Session created");

    let info = SessionInfo::new(&user, &session, true);
    with_cookie(&state, &token, info)
}

/// GET /api/v1/session
pub async fn current(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<DataResponse<SessionInfo>>> {
    let token = session_token(&headers)
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("No session found".into())))?;

    let found = SessionRepo::find_with_user(&state.pool, token)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Invalid session".into())))?;

    SessionRepo::touch(&state.pool, found.session.id).await?;

    Ok(Json(DataResponse::new(SessionInfo::new(
        &found.user,
        &found.session,
        false,
    ))))
}

fn with_cookie(state: &AppState, token: &str, info: SessionInfo) -> AppResult<Response> {
    let cookie = session_cookie(token, state.config.session.cookie_secure)?;
    Ok(([(SET_COOKIE, cookie)], Json(DataResponse::new(info))).into_response())
}
