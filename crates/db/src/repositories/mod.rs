//! Repository layer: one zero-sized struct per table, each exposing async
//! CRUD functions over a `PgPool`.

pub mod playlist_repo;
pub mod session_repo;
pub mod track_repo;
pub mod user_repo;

pub use playlist_repo::PlaylistRepo;
pub use session_repo::SessionRepo;
pub use track_repo::TrackRepo;
pub use user_repo::UserRepo;

/// Clamp an optional caller-supplied page size into `1..=max`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}
