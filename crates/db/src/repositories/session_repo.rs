//! Repository for the `sessions` table.

use sqlx::PgPool;

use crate::models::session::{CreateSession, Session, SessionWithUser};
use crate::repositories::UserRepo;

const COLUMNS: &str = "id, user_id, session_token, user_agent, created_at, last_seen_at";

/// Provides session creation and token lookup.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (user_id, session_token, user_agent) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.user_id)
            .bind(&input.session_token)
            .bind(&input.user_agent)
            .fetch_one(pool)
            .await
    }

    /// Find a session by its token.
    pub async fn find_by_token(
        pool: &PgPool,
        session_token: &str,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE session_token = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(session_token)
            .fetch_optional(pool)
            .await
    }

    /// Resolve a token to its session and owning user.
    pub async fn find_with_user(
        pool: &PgPool,
        session_token: &str,
    ) -> Result<Option<SessionWithUser>, sqlx::Error> {
        let Some(session) = Self::find_by_token(pool, session_token).await? else {
            return Ok(None);
        };
        let Some(user) = UserRepo::find_by_id(pool, session.user_id).await? else {
            return Ok(None);
        };
        Ok(Some(SessionWithUser { session, user }))
    }

    /// Bump `last_seen_at` for a session.
    pub async fn touch(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sessions SET last_seen_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
