//! Daily usage counter rows.

use intervue_core::types::{DbId, Timestamp};
use intervue_core::usage_quota::UsageRecord;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_usage` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserUsage {
    pub id: DbId,
    pub user_id: DbId,
    /// Local midnight of the day this row counts.
    pub date: Timestamp,
    pub interviews_used: i32,
    pub results_viewed: i32,
    pub retakes_done: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<UserUsage> for UsageRecord {
    fn from(row: UserUsage) -> Self {
        UsageRecord {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            interviews_used: row.interviews_used,
            results_viewed: row.results_viewed,
            retakes_done: row.retakes_done,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
