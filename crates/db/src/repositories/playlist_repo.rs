//! Repository for the `playlists` table.

use std::collections::HashMap;

use hyde_core::generation::{PlaylistDraft, TrackDraft};
use hyde_core::status::PlaylistStatus;
use hyde_core::types::DbId;
use sqlx::PgPool;

use crate::models::playlist::{PlaylistRow, PlaylistWithTracks, UpdatePlaylist};
use crate::models::track::TrackRow;
use crate::repositories::TrackRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, name, description, prompt, genre, mood, \
    cover_image_url, status_id, created_at, updated_at";

/// Provides CRUD operations for playlists.
pub struct PlaylistRepo;

impl PlaylistRepo {
    /// Insert a playlist and its tracks in one transaction.
    ///
    /// If any track insert fails the playlist row is rolled back too.
    pub async fn create_with_tracks(
        pool: &PgPool,
        draft: &PlaylistDraft,
        tracks: &[TrackDraft],
    ) -> Result<PlaylistWithTracks, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO playlists (user_id, name, prompt, genre, mood, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let playlist = sqlx::query_as::<_, PlaylistRow>(&query)
            .bind(draft.owner_id)
            .bind(&draft.name)
            .bind(&draft.prompt)
            .bind(&draft.genre)
            .bind(&draft.mood)
            .bind(draft.status.id())
            .fetch_one(&mut *tx)
            .await?;

        let mut rows = Vec::with_capacity(tracks.len());
        for track in tracks {
            rows.push(TrackRepo::insert(&mut *tx, playlist.id, track).await?);
        }
        rows.sort_by_key(|t| t.track_order);

        tx.commit().await?;

        tracing::debug!(
            playlist_id = playlist.id,
            track_count = rows.len(),
            "Playlist created",
        );

        Ok(PlaylistWithTracks {
            playlist,
            tracks: rows,
        })
    }

    /// Find a playlist by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PlaylistRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM playlists WHERE id = $1");
        sqlx::query_as::<_, PlaylistRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a playlist together with its ordered tracks.
    pub async fn find_with_tracks(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PlaylistWithTracks>, sqlx::Error> {
        let Some(playlist) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let tracks = TrackRepo::list_by_playlist(pool, id).await?;
        Ok(Some(PlaylistWithTracks { playlist, tracks }))
    }

    /// List playlists newest first, optionally restricted to one owner.
    pub async fn list(
        pool: &PgPool,
        owner_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<PlaylistWithTracks>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM playlists \
             WHERE ($1::BIGINT IS NULL OR user_id = $1) \
             ORDER BY created_at DESC LIMIT $2"
        );
        let playlists = sqlx::query_as::<_, PlaylistRow>(&query)
            .bind(owner_id)
            .bind(limit)
            .fetch_all(pool)
            .await?;
        Self::attach_tracks(pool, playlists).await
    }

    /// Newest playlists that have at least one playable track.
    pub async fn list_featured(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<PlaylistWithTracks>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM playlists \
             WHERE status_id IN ($1, $2) \
             ORDER BY created_at DESC LIMIT $3"
        );
        let playlists = sqlx::query_as::<_, PlaylistRow>(&query)
            .bind(PlaylistStatus::Ready.id())
            .bind(PlaylistStatus::Partial.id())
            .bind(limit)
            .fetch_all(pool)
            .await?;
        Self::attach_tracks(pool, playlists).await
    }

    /// Patch a playlist. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePlaylist,
    ) -> Result<Option<PlaylistRow>, sqlx::Error> {
        let query = format!(
            "UPDATE playlists SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                cover_image_url = COALESCE($4, cover_image_url), \
                status_id = COALESCE($5, status_id) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PlaylistRow>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.cover_image_url)
            .bind(input.status.map(PlaylistStatus::id))
            .fetch_optional(pool)
            .await
    }

    /// Delete a playlist and, by cascade, its tracks.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Load tracks for a page of playlists with a single query.
    async fn attach_tracks(
        pool: &PgPool,
        playlists: Vec<PlaylistRow>,
    ) -> Result<Vec<PlaylistWithTracks>, sqlx::Error> {
        let ids: Vec<DbId> = playlists.iter().map(|p| p.id).collect();
        let mut by_playlist: HashMap<DbId, Vec<TrackRow>> = HashMap::new();
        for track in TrackRepo::list_by_playlists(pool, &ids).await? {
            by_playlist.entry(track.playlist_id).or_default().push(track);
        }

        Ok(playlists
            .into_iter()
            .map(|playlist| {
                let tracks = by_playlist.remove(&playlist.id).unwrap_or_default();
                PlaylistWithTracks { playlist, tracks }
            })
            .collect())
    }
}
