//! Repository round-trips against a real Postgres.
//!
//! These need `DATABASE_URL`; run with `cargo test -- --ignored`.

use hyde_core::generation::{GenerationMode, GenerationRequest};
use hyde_core::playlist::Playlist;
use hyde_core::status::{PlaylistStatus, TrackStatus};
use hyde_db::models::playlist::UpdatePlaylist;
use hyde_db::models::session::CreateSession;
use hyde_db::models::track::UpdateTrack;
use hyde_db::repositories::{PlaylistRepo, SessionRepo, TrackRepo, UserRepo};
use sqlx::PgPool;

async fn seed_playlist(pool: &PgPool, mode: GenerationMode) -> hyde_db::models::playlist::PlaylistWithTracks {
    let user = UserRepo::get_or_create_by_ip_hash(pool, "hash-a").await.unwrap();
    let req = GenerationRequest::new("late night coding", mode).with_genre("Lo-fi");
    PlaylistRepo::create_with_tracks(pool, &req.playlist_draft(Some(user.id)), &req.track_drafts())
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_bootstrap_seeds_status_lookups(pool: PgPool) {
    hyde_db::health_check(&pool).await.unwrap();
    for table in ["playlist_statuses", "track_statuses"] {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert!(count.0 > 0, "{table} should have seed data");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_create_playlist_with_tracks(pool: PgPool) {
    let created = seed_playlist(&pool, GenerationMode::Playlist).await;
    assert_eq!(created.playlist.status_id, PlaylistStatus::Generating.id());
    assert_eq!(created.tracks.len(), 3);

    let loaded = PlaylistRepo::find_with_tracks(&pool, created.playlist.id)
        .await
        .unwrap()
        .expect("playlist should exist");
    let playlist = Playlist::try_from(loaded).unwrap();
    assert_eq!(playlist.name, "late night coding");
    let orders: Vec<i32> = playlist.tracks.iter().map(|t| t.track_order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert!(playlist.tracks.iter().all(|t| t.status == TrackStatus::Pending));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_track_update_is_idempotent_and_clears_error(pool: PgPool) {
    let created = seed_playlist(&pool, GenerationMode::Single).await;
    let track_id = created.tracks[0].id;

    let failed = TrackRepo::update(&pool, track_id, &UpdateTrack::failed("boom".into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.error.as_deref(), Some("boom"));

    let patch = UpdateTrack::ready("https://cdn/a.mp3".into(), None);
    let first = TrackRepo::update(&pool, track_id, &patch).await.unwrap().unwrap();
    let second = TrackRepo::update(&pool, track_id, &patch).await.unwrap().unwrap();
    assert_eq!(first.status_id, TrackStatus::Ready.id());
    assert_eq!(first.error, None);
    assert_eq!(first.audio_url, second.audio_url);
    assert_eq!(first.status_id, second.status_id);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_featured_and_recent_listing(pool: PgPool) {
    let created = seed_playlist(&pool, GenerationMode::Single).await;
    let track_id = created.tracks[0].id;

    assert!(PlaylistRepo::list_featured(&pool, 12).await.unwrap().is_empty());
    assert!(TrackRepo::list_recent_ready(&pool, 20).await.unwrap().is_empty());

    TrackRepo::update(&pool, track_id, &UpdateTrack::ready("https://cdn/a.mp3".into(), None))
        .await
        .unwrap();
    PlaylistRepo::update(
        &pool,
        created.playlist.id,
        &UpdatePlaylist::status(PlaylistStatus::Ready),
    )
    .await
    .unwrap();

    let featured = PlaylistRepo::list_featured(&pool, 12).await.unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0].tracks.len(), 1);
    assert_eq!(TrackRepo::list_recent_ready(&pool, 20).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_delete_playlist_cascades_to_tracks(pool: PgPool) {
    let created = seed_playlist(&pool, GenerationMode::Playlist).await;
    assert!(PlaylistRepo::delete(&pool, created.playlist.id).await.unwrap());
    assert!(TrackRepo::find_by_id(&pool, created.tracks[0].id).await.unwrap().is_none());
    assert!(!PlaylistRepo::delete(&pool, created.playlist.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_user_upsert_and_session_lookup(pool: PgPool) {
    let a = UserRepo::get_or_create_by_ip_hash(&pool, "hash-b").await.unwrap();
    let b = UserRepo::get_or_create_by_ip_hash(&pool, "hash-b").await.unwrap();
    assert_eq!(a.id, b.id);

    let session = SessionRepo::create(
        &pool,
        &CreateSession {
            user_id: a.id,
            session_token: "tok".into(),
            user_agent: Some("test".into()),
        },
    )
    .await
    .unwrap();
    let found = SessionRepo::find_with_user(&pool, "tok").await.unwrap().unwrap();
    assert_eq!(found.session.id, session.id);
    assert_eq!(found.user.id, a.id);
    assert!(SessionRepo::find_with_user(&pool, "missing").await.unwrap().is_none());
}
