//! Repository for the `refresh_tokens` table (the token ledger).

use gatehouse_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, token_hash, expires_at, revoked, \
                        device_info, ip_address, created_at";

/// Provides ledger operations for refresh tokens.
pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    /// Insert a new refresh token record, returning the created row.
    ///
    /// `input.token_hash` must already be the SHA-256 digest; the plaintext
    /// token never reaches this layer.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at, device_info, ip_address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(input.user_id)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .bind(&input.device_info)
            .bind(&input.ip_address)
            .fetch_one(executor)
            .await
    }

    /// Find an unrevoked token by its hash.
    ///
    /// Expiry is deliberately NOT filtered here: an expired-but-unrevoked row
    /// is still returned so the caller can report expiry distinctly from
    /// "not found or revoked".
    pub async fn find_by_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM refresh_tokens
             WHERE token_hash = $1 AND revoked = false"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke a token by id. Returns `true` if the row transitioned.
    ///
    /// The `revoked = false` guard makes the transition at-most-once under
    /// concurrent refresh calls: only one caller observes `true`.
    pub async fn revoke_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = true WHERE id = $1 AND revoked = false",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke a token by its hash. Idempotent; returns whether a row changed.
    pub async fn revoke_by_hash(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = true WHERE token_hash = $1 AND revoked = false",
        )
        .bind(token_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke all active tokens for a user. Returns the revoked count.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = true
             WHERE user_id = $1 AND revoked = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete rows past expiry. Returns the count of deleted rows.
    ///
    /// Run from the background sweeper, not per-request.
    pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
