//! Anonymous user rows, keyed by hashed client IP.

use hyde_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    #[serde(skip_serializing)]
    pub ip_hash: String,
    pub created_at: Timestamp,
    pub last_seen_at: Timestamp,
}
