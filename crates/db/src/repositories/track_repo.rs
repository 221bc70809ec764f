//! Repository for the `tracks` table.

use hyde_core::generation::TrackDraft;
use hyde_core::status::TrackStatus;
use hyde_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::track::{TrackRow, UpdateTrack};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, playlist_id, title, prompt, genre, mood, duration, \
    audio_url, image_url, status_id, error, track_order, created_at";

/// Provides CRUD operations for tracks.
pub struct TrackRepo;

impl TrackRepo {
    /// Insert one track for `playlist_id`. Runs on a caller-provided
    /// connection so it can join the playlist's transaction.
    pub async fn insert(
        conn: &mut PgConnection,
        playlist_id: DbId,
        draft: &TrackDraft,
    ) -> Result<TrackRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO tracks \
                (playlist_id, title, prompt, genre, mood, duration, status_id, track_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrackRow>(&query)
            .bind(playlist_id)
            .bind(&draft.title)
            .bind(&draft.prompt)
            .bind(&draft.genre)
            .bind(&draft.mood)
            .bind(draft.duration)
            .bind(draft.status.id())
            .bind(draft.track_order)
            .fetch_one(conn)
            .await
    }

    /// Find a track by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TrackRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tracks WHERE id = $1");
        sqlx::query_as::<_, TrackRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All tracks of one playlist, ordered by `track_order`.
    pub async fn list_by_playlist(
        pool: &PgPool,
        playlist_id: DbId,
    ) -> Result<Vec<TrackRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM tracks WHERE playlist_id = $1 ORDER BY track_order");
        sqlx::query_as::<_, TrackRow>(&query)
            .bind(playlist_id)
            .fetch_all(pool)
            .await
    }

    /// Tracks for several playlists at once, ordered by playlist then
    /// `track_order`.
    pub async fn list_by_playlists(
        pool: &PgPool,
        playlist_ids: &[DbId],
    ) -> Result<Vec<TrackRow>, sqlx::Error> {
        if playlist_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM tracks WHERE playlist_id = ANY($1) \
             ORDER BY playlist_id, track_order"
        );
        sqlx::query_as::<_, TrackRow>(&query)
            .bind(playlist_ids)
            .fetch_all(pool)
            .await
    }

    /// Most recent playable tracks, newest first.
    pub async fn list_recent_ready(pool: &PgPool, limit: i64) -> Result<Vec<TrackRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tracks \
             WHERE status_id = $1 AND audio_url IS NOT NULL \
             ORDER BY created_at DESC LIMIT $2"
        );
        sqlx::query_as::<_, TrackRow>(&query)
            .bind(TrackStatus::Ready.id())
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Patch a track. Only non-`None` fields are applied; a status other
    /// than `error` clears the stored error message.
    ///
    /// Returns `None` if no row with the given `id` exists. Applying the
    /// same patch twice yields the same row, so callers may retry freely.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTrack,
    ) -> Result<Option<TrackRow>, sqlx::Error> {
        let query = format!(
            "UPDATE tracks SET \
                title = COALESCE($2, title), \
                audio_url = COALESCE($3, audio_url), \
                image_url = COALESCE($4, image_url), \
                status_id = COALESCE($5::SMALLINT, status_id), \
                error = CASE \
                    WHEN $5::SMALLINT IS NOT NULL AND $5::SMALLINT <> $7 THEN NULL \
                    ELSE COALESCE($6, error) \
                END \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrackRow>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.audio_url)
            .bind(&input.image_url)
            .bind(input.status.map(TrackStatus::id))
            .bind(&input.error)
            .bind(TrackStatus::Error.id())
            .fetch_optional(pool)
            .await
    }

    /// Delete a track. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tracks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
