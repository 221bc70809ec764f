//! Session-cookie extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use hyde_core::error::CoreError;
use hyde_core::session::{SESSION_COOKIE_MAX_AGE_SECS, SESSION_COOKIE_NAME};
use hyde_core::types::DbId;
use hyde_db::repositories::SessionRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The anonymous user behind a valid `hyde_session` cookie.
///
/// ```ignore
/// async fn my_handler(owner: SessionOwner) -> AppResult<Json<()>> {
///     tracing::info!(user_id = owner.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOwner {
    pub user_id: DbId,
    pub session_id: DbId,
}

impl FromRequestParts<AppState> for SessionOwner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("No session found".into()))
        })?;

        let found = SessionRepo::find_with_user(&state.pool, token)
            .await?
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Invalid session".into())))?;

        Ok(SessionOwner {
            user_id: found.user.id,
            session_id: found.session.id,
        })
    }
}

/// Like [`SessionOwner`], but a missing or unknown cookie yields `None`
/// instead of a 401.
#[derive(Debug, Clone, Copy)]
pub struct MaybeSessionOwner(pub Option<SessionOwner>);

impl MaybeSessionOwner {
    pub fn user_id(&self) -> Option<DbId> {
        self.0.map(|o| o.user_id)
    }
}

impl FromRequestParts<AppState> for MaybeSessionOwner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match SessionOwner::from_request_parts(parts, state).await {
            Ok(owner) => Ok(Self(Some(owner))),
            Err(AppError::Core(CoreError::Unauthorized(_))) => Ok(Self(None)),
            Err(e) => Err(e),
        }
    }
}

/// Value of the session cookie, if the request carries one.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for a session token: HTTP-only, `SameSite=Lax`,
/// valid for one year.
///
/// Fails when the token holds bytes that are not allowed in a header.
pub fn session_cookie(token: &str, secure: bool) -> AppResult<HeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; Max-Age={SESSION_COOKIE_MAX_AGE_SECS}; \
         HttpOnly; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| {
        AppError::Core(CoreError::Internal(format!(
            "Session cookie is not a valid header value: {e}"
        )))
    })
}
