//! Repository for the `user_usage` table.
//!
//! Rows are never reset or deleted; each day gets its own row.

use intervue_core::plan::ActionType;
use intervue_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::usage::UserUsage;

const COLUMNS: &str = "id, user_id, date, interviews_used, results_viewed, retakes_done, \
                       created_at, updated_at";

/// Daily usage counters.
pub struct UsageRepo;

impl UsageRepo {
    /// Most recent row for the user dated at or after `since`.
    pub async fn find_since(
        pool: &PgPool,
        user_id: DbId,
        since: Timestamp,
    ) -> Result<Option<UserUsage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_usage
             WHERE user_id = $1 AND date >= $2
             ORDER BY date DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, UserUsage>(&query)
            .bind(user_id)
            .bind(since)
            .fetch_optional(pool)
            .await
    }

    /// Insert a zero-valued row for `(user_id, date)`.
    ///
    /// If a concurrent request already created it, the existing row is
    /// returned unchanged.
    pub async fn create_for_day(
        pool: &PgPool,
        user_id: DbId,
        date: Timestamp,
    ) -> Result<UserUsage, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_usage (user_id, date)
             VALUES ($1, $2)
             ON CONFLICT (user_id, date) DO UPDATE SET user_id = EXCLUDED.user_id
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserUsage>(&query)
            .bind(user_id)
            .bind(date)
            .fetch_one(pool)
            .await
    }

    /// Increment one counter by 1 in a single UPDATE.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn increment(
        pool: &PgPool,
        id: DbId,
        action: ActionType,
    ) -> Result<Option<UserUsage>, sqlx::Error> {
        let column = action.usage_column();
        let query = format!(
            "UPDATE user_usage SET {column} = {column} + 1, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserUsage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Increment one counter only while it is below `cap`.
    ///
    /// Returns `None` when the counter has already reached `cap` (or the
    /// row does not exist).
    pub async fn increment_below(
        pool: &PgPool,
        id: DbId,
        action: ActionType,
        cap: i32,
    ) -> Result<Option<UserUsage>, sqlx::Error> {
        let column = action.usage_column();
        let query = format!(
            "UPDATE user_usage SET {column} = {column} + 1, updated_at = NOW()
             WHERE id = $1 AND {column} < $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserUsage>(&query)
            .bind(id)
            .bind(cap)
            .fetch_optional(pool)
            .await
    }

    /// A user's daily rows, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<UserUsage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_usage
             WHERE user_id = $1
             ORDER BY date DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, UserUsage>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
