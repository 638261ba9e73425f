//! Repository for the `login_attempts` table (rate-limiter backing store).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Provides rate-limit accounting over login attempts.
pub struct LoginAttemptRepo;

impl LoginAttemptRepo {
    /// Append one attempt record. Success and failure are both recorded;
    /// only failures count toward the block threshold.
    pub async fn record(
        pool: &PgPool,
        identifier: &str,
        origin: &str,
        succeeded: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO login_attempts (identifier, origin, succeeded)
             VALUES ($1, $2, $3)",
        )
        .bind(identifier)
        .bind(origin)
        .bind(succeeded)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Count failed attempts for the (identifier, origin) pair since `cutoff`.
    ///
    /// Window-based by design: a successful attempt does not retroactively
    /// clear prior failures within the window.
    pub async fn failed_count_since(
        pool: &PgPool,
        identifier: &str,
        origin: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM login_attempts
             WHERE identifier = $1
               AND origin = $2
               AND succeeded = false
               AND attempted_at >= $3",
        )
        .bind(identifier)
        .bind(origin)
        .bind(cutoff)
        .fetch_one(pool)
        .await
    }

    /// Delete attempt records older than `cutoff`. Returns the deleted count.
    pub async fn delete_older_than(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM login_attempts WHERE attempted_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
