//! Repository for the `subscription_plans` table.

use sqlx::PgPool;

use crate::models::subscription_plan::{SubscriptionPlan, UpdatePlanLimits};

const COLUMNS: &str = "id, name, interviews_per_day, results_per_day, retakes_per_day, \
                       created_at, updated_at";

/// Read and administrative update access to plan reference data.
pub struct SubscriptionPlanRepo;

impl SubscriptionPlanRepo {
    /// Find a plan by its unique name (case-sensitive).
    pub async fn find_by_name(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subscription_plans WHERE name = $1");
        sqlx::query_as::<_, SubscriptionPlan>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List all plans in seed order.
    pub async fn list(pool: &PgPool) -> Result<Vec<SubscriptionPlan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subscription_plans ORDER BY id");
        sqlx::query_as::<_, SubscriptionPlan>(&query)
            .fetch_all(pool)
            .await
    }

    /// Update a plan's limits. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no plan with the given name exists.
    pub async fn update_limits(
        pool: &PgPool,
        name: &str,
        input: &UpdatePlanLimits,
    ) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
        let query = format!(
            "UPDATE subscription_plans SET
                interviews_per_day = COALESCE($2, interviews_per_day),
                results_per_day = COALESCE($3, results_per_day),
                retakes_per_day = COALESCE($4, retakes_per_day),
                updated_at = NOW()
             WHERE name = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SubscriptionPlan>(&query)
            .bind(name)
            .bind(input.interviews_per_day)
            .bind(input.results_per_day)
            .bind(input.retakes_per_day)
            .fetch_optional(pool)
            .await
    }
}
