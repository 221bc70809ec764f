//! Repository for the `users` table.

use sqlx::PgPool;

use crate::models::user::User;

const COLUMNS: &str = "id, ip_hash, created_at, last_seen_at";

/// Provides lookup and upsert for anonymous users.
pub struct UserRepo;

impl UserRepo {
    /// Return the user for `ip_hash`, creating it on first sight.
    ///
    /// An existing user has its `last_seen_at` bumped.
    pub async fn get_or_create_by_ip_hash(
        pool: &PgPool,
        ip_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (ip_hash) VALUES ($1) \
             ON CONFLICT ON CONSTRAINT uq_users_ip_hash \
             DO UPDATE SET last_seen_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(ip_hash)
            .fetch_one(pool)
            .await
    }

    /// Find a user by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
