//! Postgres-backed [`QuotaStore`].
//!
//! Every query runs under [`ClassifiedBackoffRetry`], so rate-limited
//! failures from the hosted database are retried while everything else is
//! reported to the gate on the first failure. All statements here are
//! single-row reads or single-statement writes, which keeps retrying them
//! safe.

use async_trait::async_trait;
use intervue_core::plan::{ActionType, PlanLimits};
use intervue_core::retry::{ClassifiedBackoffRetry, RetryPolicy};
use intervue_core::types::{DbId, Timestamp};
use intervue_core::usage_quota::{QuotaStore, QuotaStoreError, UsageRecord, UserPlan};
use sqlx::PgPool;

use crate::repositories::{SubscriptionPlanRepo, UsageRepo, UserRepo};

#[derive(Debug, Clone)]
pub struct PgQuotaStore {
    pool: PgPool,
    retry: ClassifiedBackoffRetry,
}

impl PgQuotaStore {
    pub fn new(pool: PgPool, policy: RetryPolicy) -> Self {
        Self {
            pool,
            retry: ClassifiedBackoffRetry::new(policy),
        }
    }
}

#[async_trait]
impl QuotaStore for PgQuotaStore {
    async fn find_user_plan(&self, user_id: DbId) -> Result<Option<UserPlan>, QuotaStoreError> {
        let user = self
            .retry
            .run(|| UserRepo::find_by_id(&self.pool, user_id))
            .await
            .map_err(QuotaStoreError::new)?;
        Ok(user.map(UserPlan::from))
    }

    async fn find_plan(&self, name: &str) -> Result<Option<PlanLimits>, QuotaStoreError> {
        let plan = self
            .retry
            .run(|| SubscriptionPlanRepo::find_by_name(&self.pool, name))
            .await
            .map_err(QuotaStoreError::new)?;
        Ok(plan.map(PlanLimits::from))
    }

    async fn find_usage_since(
        &self,
        user_id: DbId,
        since: Timestamp,
    ) -> Result<Option<UsageRecord>, QuotaStoreError> {
        let row = self
            .retry
            .run(|| UsageRepo::find_since(&self.pool, user_id, since))
            .await
            .map_err(QuotaStoreError::new)?;
        Ok(row.map(UsageRecord::from))
    }

    async fn create_usage(
        &self,
        user_id: DbId,
        date: Timestamp,
    ) -> Result<UsageRecord, QuotaStoreError> {
        let row = self
            .retry
            .run(|| UsageRepo::create_for_day(&self.pool, user_id, date))
            .await
            .map_err(QuotaStoreError::new)?;
        tracing::debug!(user_id, usage_id = row.id, "Usage record for today ready");
        Ok(row.into())
    }

    async fn increment_usage(
        &self,
        record_id: DbId,
        action: ActionType,
    ) -> Result<UsageRecord, QuotaStoreError> {
        let row = self
            .retry
            .run(|| UsageRepo::increment(&self.pool, record_id, action))
            .await
            .map_err(QuotaStoreError::new)?;
        row.map(UsageRecord::from)
            .ok_or_else(|| QuotaStoreError::new(format!("usage record {record_id} not found")))
    }

    async fn increment_usage_below(
        &self,
        record_id: DbId,
        action: ActionType,
        cap: i32,
    ) -> Result<Option<UsageRecord>, QuotaStoreError> {
        let row = self
            .retry
            .run(|| UsageRepo::increment_below(&self.pool, record_id, action, cap))
            .await
            .map_err(QuotaStoreError::new)?;
        Ok(row.map(UsageRecord::from))
    }
}
