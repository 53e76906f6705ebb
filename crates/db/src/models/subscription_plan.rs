//! Subscription plan model and the administrative update DTO.

use intervue_core::error::CoreError;
use intervue_core::plan::{validate_daily_limit, PlanLimits};
use intervue_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `subscription_plans` table.
///
/// Limits are stored raw: `-1` means unlimited.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubscriptionPlan {
    pub id: DbId,
    pub name: String,
    pub interviews_per_day: i32,
    pub results_per_day: i32,
    pub retakes_per_day: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<SubscriptionPlan> for PlanLimits {
    fn from(plan: SubscriptionPlan) -> Self {
        PlanLimits {
            name: plan.name,
            interviews_per_day: plan.interviews_per_day.into(),
            results_per_day: plan.results_per_day.into(),
            retakes_per_day: plan.retakes_per_day.into(),
        }
    }
}

/// DTO for updating a plan's limits. Only non-`None` fields are applied.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlanLimits {
    pub interviews_per_day: Option<i32>,
    pub results_per_day: Option<i32>,
    pub retakes_per_day: Option<i32>,
}

impl UpdatePlanLimits {
    /// Reject values below the `-1` sentinel.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [
            (self.interviews_per_day, "interviews_per_day"),
            (self.results_per_day, "results_per_day"),
            (self.retakes_per_day, "retakes_per_day"),
        ];
        for (value, name) in fields {
            if let Some(value) = value {
                validate_daily_limit(value, name)?;
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.interviews_per_day.is_none()
            && self.results_per_day.is_none()
            && self.retakes_per_day.is_none()
    }
}
