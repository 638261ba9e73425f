//! Repository for the `sessions` table (the session registry).

use gatehouse_core::token::constant_time_eq;
use gatehouse_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::session::{CreateSession, Session};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, refresh_token_id, csrf_token, expires_at, \
                        last_activity_at, ip_address, user_agent, device_fingerprint, \
                        active, created_at";

/// Sessions idle longer than this are swept even if not yet expired.
const IDLE_CEILING_HOURS: i64 = 24;

/// Provides registry operations for sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateSession,
    ) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (user_id, refresh_token_id, csrf_token, expires_at,
                                   ip_address, user_agent, device_fingerprint)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.user_id)
            .bind(input.refresh_token_id)
            .bind(&input.csrf_token)
            .bind(input.expires_at)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .bind(&input.device_fingerprint)
            .fetch_one(executor)
            .await
    }

    /// Find a session by id, regardless of state.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the active, unexpired session backed by the given refresh token.
    pub async fn find_active_by_refresh_token_id(
        pool: &PgPool,
        refresh_token_id: DbId,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE refresh_token_id = $1
               AND active = true
               AND expires_at > NOW()"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(refresh_token_id)
            .fetch_optional(pool)
            .await
    }

    /// List active, unexpired sessions for a user, newest first.
    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE user_id = $1 AND active = true AND expires_at > NOW()
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update the session's last-activity timestamp.
    ///
    /// Called on authenticated access; callers may throttle this rather than
    /// touching on every request.
    pub async fn touch(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sessions SET last_activity_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Deactivate a single session. Returns `true` if the row was updated.
    pub async fn invalidate<'e>(executor: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE sessions SET active = false WHERE id = $1 AND active = true")
                .bind(id)
                .execute(executor)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deactivate all active sessions for a user. Returns the count.
    pub async fn invalidate_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET active = false WHERE user_id = $1 AND active = true",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Compare a presented CSRF token against the session's stored value.
    ///
    /// Returns `false` when the session does not exist or is inactive. The
    /// comparison itself is constant-time.
    pub async fn verify_csrf(
        pool: &PgPool,
        id: DbId,
        presented: &str,
    ) -> Result<bool, sqlx::Error> {
        let stored: Option<String> = sqlx::query_scalar(
            "SELECT csrf_token FROM sessions WHERE id = $1 AND active = true",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(match stored {
            Some(stored) => constant_time_eq(presented, &stored),
            None => false,
        })
    }

    /// Heuristic anomaly check: does the current request context differ from
    /// the one the session was created with?
    ///
    /// Returns `true` when the session cannot be found, or when a stored
    /// non-empty IP/user-agent differs from the current value. This is a
    /// signal for the caller to log or escalate, never an automatic block --
    /// both inputs are client-controlled.
    pub async fn detect_suspicious(
        pool: &PgPool,
        id: DbId,
        current_ip: Option<&str>,
        current_user_agent: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let Some(session) = Self::find_by_id(pool, id).await? else {
            return Ok(true);
        };

        let ip_changed = matches!(
            (&session.ip_address, current_ip),
            (Some(stored), Some(current)) if !stored.is_empty() && stored != current
        );
        let agent_changed = matches!(
            (&session.user_agent, current_user_agent),
            (Some(stored), Some(current)) if !stored.is_empty() && stored != current
        );

        Ok(ip_changed || agent_changed)
    }

    /// Delete sessions past expiry or idle beyond the inactivity ceiling.
    /// Returns the count of deleted rows.
    pub async fn sweep_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM sessions
             WHERE expires_at < NOW()
                OR last_activity_at < NOW() - make_interval(hours => $1)",
        )
        .bind(IDLE_CEILING_HOURS as i32)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
