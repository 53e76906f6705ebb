//! Per-user daily usage quota gate.
//!
//! Decides whether a user may perform one more unit of a rate-limited action
//! today and records consumption when they do. The gate deliberately fails
//! open: a lookup or write failure never blocks the caller. Each fallback is
//! an explicit `Result` handled at the boundary of the public operation and
//! logged, so the policy stays auditable.
//!
//! "Today" is derived from the injected [`Clock`] on every call: a usage
//! record belongs to today when its `date` is at or after local midnight.
//! Records are never reset; a new one is created lazily when the day rolls
//! over.
//!
//! The check and the increment are separate round trips. Two concurrent
//! requests can both pass [`QuotaGate::check_action`] before either records
//! usage, overshooting the limit by one. [`QuotaGate::try_consume`] closes
//! that window with a single conditional update.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveTime, Offset, TimeZone, Utc};
use serde::Serialize;

use crate::plan::{ActionType, DailyLimit, PlanLimits, PlanTier, DEFAULT_PLAN};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A user's subscription plan reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPlan {
    pub user_id: DbId,
    pub subscription_plan: Option<String>,
}

/// One user's usage counters for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    pub id: DbId,
    pub user_id: DbId,
    pub date: Timestamp,
    pub interviews_used: i32,
    pub results_viewed: i32,
    pub retakes_done: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UsageRecord {
    /// Synthetic all-zero record returned when the store cannot be used.
    ///
    /// Carries `id = 0`, which never matches a stored row.
    pub fn zeroed(user_id: DbId, date: Timestamp) -> Self {
        Self {
            id: 0,
            user_id,
            date,
            interviews_used: 0,
            results_viewed: 0,
            retakes_done: 0,
            created_at: date,
            updated_at: date,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.id == 0
    }

    /// The counter tracking `action`.
    pub fn used(&self, action: ActionType) -> i32 {
        match action {
            ActionType::Interviews => self.interviews_used,
            ActionType::Results => self.results_viewed,
            ActionType::Retakes => self.retakes_done,
        }
    }
}

/// Outcome of a quota check, with the numbers a caller needs to render an
/// upgrade prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub action: ActionType,
    pub plan: String,
    pub limit: DailyLimit,
    pub used: i32,
    /// Units left today; `None` when unlimited.
    pub remaining: Option<i32>,
    pub allowed: bool,
}

impl QuotaStatus {
    fn new(action: ActionType, plan: &str, limit: DailyLimit, used: i32, allowed: bool) -> Self {
        Self {
            action,
            plan: plan.to_string(),
            limit,
            used,
            remaining: limit.remaining(used),
            allowed,
        }
    }

    /// Status computed from a plan limit and the current counter.
    fn evaluate(action: ActionType, plan: &str, limit: DailyLimit, used: i32) -> Self {
        Self::new(action, plan, limit, used, limit.allows(used))
    }

    /// Status used when the user or their usage cannot be resolved.
    fn fail_open(action: ActionType) -> Self {
        let fallback = PlanLimits::free_fallback();
        Self::new(action, &fallback.name, fallback.limit_for(action), 0, true)
    }
}

/// Today's status across every action category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub plan: String,
    pub date: Timestamp,
    pub interviews: QuotaStatus,
    pub results: QuotaStatus,
    pub retakes: QuotaStatus,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Failure reported by a [`QuotaStore`].
#[derive(Debug, thiserror::Error)]
#[error("quota store error: {0}")]
pub struct QuotaStoreError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl QuotaStoreError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

/// Persistence the quota gate depends on.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    async fn find_user_plan(&self, user_id: DbId) -> Result<Option<UserPlan>, QuotaStoreError>;

    async fn find_plan(&self, name: &str) -> Result<Option<PlanLimits>, QuotaStoreError>;

    /// Most recent usage record for the user with `date >= since`.
    async fn find_usage_since(
        &self,
        user_id: DbId,
        since: Timestamp,
    ) -> Result<Option<UsageRecord>, QuotaStoreError>;

    /// Insert a zero-valued record for `(user_id, date)`, or return the
    /// existing one if it was created concurrently.
    async fn create_usage(
        &self,
        user_id: DbId,
        date: Timestamp,
    ) -> Result<UsageRecord, QuotaStoreError>;

    /// Increment one counter of the record by 1 and refresh `updated_at`.
    async fn increment_usage(
        &self,
        record_id: DbId,
        action: ActionType,
    ) -> Result<UsageRecord, QuotaStoreError>;

    /// Increment one counter only while it is below `cap`, in a single
    /// statement. Returns `None` when the counter is already at the cap.
    async fn increment_usage_below(
        &self,
        record_id: DbId,
        action: ActionType,
        cap: i32,
    ) -> Result<Option<UsageRecord>, QuotaStoreError>;
}

#[async_trait]
impl<T: QuotaStore + ?Sized> QuotaStore for Arc<T> {
    async fn find_user_plan(&self, user_id: DbId) -> Result<Option<UserPlan>, QuotaStoreError> {
        (**self).find_user_plan(user_id).await
    }

    async fn find_plan(&self, name: &str) -> Result<Option<PlanLimits>, QuotaStoreError> {
        (**self).find_plan(name).await
    }

    async fn find_usage_since(
        &self,
        user_id: DbId,
        since: Timestamp,
    ) -> Result<Option<UsageRecord>, QuotaStoreError> {
        (**self).find_usage_since(user_id, since).await
    }

    async fn create_usage(
        &self,
        user_id: DbId,
        date: Timestamp,
    ) -> Result<UsageRecord, QuotaStoreError> {
        (**self).create_usage(user_id, date).await
    }

    async fn increment_usage(
        &self,
        record_id: DbId,
        action: ActionType,
    ) -> Result<UsageRecord, QuotaStoreError> {
        (**self).increment_usage(record_id, action).await
    }

    async fn increment_usage_below(
        &self,
        record_id: DbId,
        action: ActionType,
        cap: i32,
    ) -> Result<Option<UsageRecord>, QuotaStoreError> {
        (**self).increment_usage_below(record_id, action, cap).await
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now" for day boundaries.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Local midnight of the current day, as UTC.
    fn day_start(&self) -> Timestamp;
}

/// Wall clock in the server's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn day_start(&self) -> Timestamp {
        day_start(&Local::now())
    }
}

/// A clock frozen at a given instant and offset.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<chrono::FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0.with_timezone(&Utc)
    }

    fn day_start(&self) -> Timestamp {
        day_start(&self.0)
    }
}

/// Truncate `now` to midnight in its own time zone and return that instant.
pub fn day_start<Tz: TimeZone>(now: &DateTime<Tz>) -> Timestamp {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Midnight skipped by a DST jump; use the offset in effect now.
        None => {
            let offset = now.offset().fix().local_minus_utc();
            (midnight - Duration::seconds(i64::from(offset))).and_utc()
        }
    }
}

// ---------------------------------------------------------------------------
// QuotaGate
// ---------------------------------------------------------------------------

/// Daily usage quota gate over a [`QuotaStore`].
pub struct QuotaGate<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: QuotaStore> QuotaGate<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Whether the user may perform one more unit of `action` today.
    ///
    /// Returns `true` whenever the decision cannot be made.
    pub async fn can_perform_action(&self, user_id: DbId, action: ActionType) -> bool {
        self.check_action(user_id, action).await.allowed
    }

    /// Evaluate the quota for one more unit of `action` without recording it.
    pub async fn check_action(&self, user_id: DbId, action: ActionType) -> QuotaStatus {
        let Some(plan) = self.resolve_plan_name(user_id).await else {
            return QuotaStatus::fail_open(action);
        };

        if PlanTier::is_premium(&plan) {
            let used = self
                .peek_today_usage(user_id)
                .await
                .map_or(0, |record| record.used(action));
            return QuotaStatus::new(action, &plan, DailyLimit::Unlimited, used, true);
        }

        let usage = self.get_or_create_today_usage(user_id).await;
        let limits = self.plan_limits(&plan).await;
        QuotaStatus::evaluate(
            action,
            &limits.name,
            limits.limit_for(action),
            usage.used(action),
        )
    }

    /// Today's usage record, created lazily with zero counters.
    ///
    /// Falls back to [`UsageRecord::zeroed`] when the store fails.
    pub async fn get_or_create_today_usage(&self, user_id: DbId) -> UsageRecord {
        let since = self.clock.day_start();
        match self.fetch_or_create_usage(user_id, since).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Usage lookup failed, assuming zero usage");
                self.synthetic_usage(user_id, since)
            }
        }
    }

    /// Record one unit of `action` for today.
    ///
    /// Never fails: a bookkeeping error yields a zeroed record so the
    /// primary action is not blocked.
    pub async fn increment_usage(&self, user_id: DbId, action: ActionType) -> UsageRecord {
        let since = self.clock.day_start();
        let result = async {
            let record = self.fetch_or_create_usage(user_id, since).await?;
            self.store.increment_usage(record.id, action).await
        }
        .await;

        match result {
            Ok(updated) => {
                tracing::debug!(
                    user_id,
                    action = action.as_str(),
                    used = updated.used(action),
                    "Usage incremented",
                );
                updated
            }
            Err(e) => {
                tracing::warn!(
                    user_id,
                    action = action.as_str(),
                    error = %e,
                    "Usage increment failed, continuing without bookkeeping",
                );
                self.synthetic_usage(user_id, since)
            }
        }
    }

    /// Check and record one unit of `action` in a single conditional update.
    ///
    /// `allowed` reports whether the unit was consumed. Store failures fail
    /// open like every other gate operation.
    pub async fn try_consume(&self, user_id: DbId, action: ActionType) -> QuotaStatus {
        let Some(plan) = self.resolve_plan_name(user_id).await else {
            return QuotaStatus::fail_open(action);
        };

        let since = self.clock.day_start();
        let record = match self.fetch_or_create_usage(user_id, since).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Usage lookup failed, allowing action");
                return QuotaStatus::fail_open(action);
            }
        };

        let (plan, limit) = if PlanTier::is_premium(&plan) {
            (plan, DailyLimit::Unlimited)
        } else {
            let limits = self.plan_limits(&plan).await;
            let limit = limits.limit_for(action);
            (limits.name, limit)
        };
        let used = record.used(action);

        let outcome = match limit {
            DailyLimit::Unlimited => self
                .store
                .increment_usage(record.id, action)
                .await
                .map(Some),
            DailyLimit::Capped(cap) => {
                self.store
                    .increment_usage_below(record.id, action, cap)
                    .await
            }
        };

        match outcome {
            Ok(Some(updated)) => {
                QuotaStatus::new(action, &plan, limit, updated.used(action), true)
            }
            Ok(None) => {
                let used = match limit {
                    DailyLimit::Capped(cap) => used.max(cap),
                    DailyLimit::Unlimited => used,
                };
                tracing::info!(
                    user_id,
                    action = action.as_str(),
                    plan = %plan,
                    used,
                    "Daily quota exhausted",
                );
                QuotaStatus::new(action, &plan, limit, used, false)
            }
            Err(e) => {
                tracing::warn!(
                    user_id,
                    action = action.as_str(),
                    error = %e,
                    "Conditional usage increment failed, allowing action",
                );
                QuotaStatus::new(action, &plan, limit, used, true)
            }
        }
    }

    /// Today's status for every action category.
    pub async fn usage_summary(&self, user_id: DbId) -> UsageSummary {
        let plan = self
            .resolve_plan_name(user_id)
            .await
            .unwrap_or_else(|| DEFAULT_PLAN.to_string());
        let usage = self.get_or_create_today_usage(user_id).await;

        let limits = if PlanTier::is_premium(&plan) {
            PlanLimits {
                name: plan.clone(),
                interviews_per_day: DailyLimit::Unlimited,
                results_per_day: DailyLimit::Unlimited,
                retakes_per_day: DailyLimit::Unlimited,
            }
        } else {
            self.plan_limits(&plan).await
        };

        let status = |action| {
            QuotaStatus::evaluate(
                action,
                &limits.name,
                limits.limit_for(action),
                usage.used(action),
            )
        };

        UsageSummary {
            interviews: status(ActionType::Interviews),
            results: status(ActionType::Results),
            retakes: status(ActionType::Retakes),
            date: usage.date,
            plan: limits.name.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// The user's plan name, or `None` when the user cannot be resolved.
    async fn resolve_plan_name(&self, user_id: DbId) -> Option<String> {
        match self.store.find_user_plan(user_id).await {
            Ok(Some(user)) => Some(
                user.subscription_plan
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| DEFAULT_PLAN.to_string()),
            ),
            Ok(None) => {
                tracing::warn!(user_id, "User not found for quota check, allowing action");
                None
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "User lookup failed, allowing action");
                None
            }
        }
    }

    /// Limits of the named plan, or the free-tier fallback.
    async fn plan_limits(&self, name: &str) -> PlanLimits {
        match self.store.find_plan(name).await {
            Ok(Some(limits)) => limits,
            Ok(None) => {
                tracing::warn!(plan = name, "Plan not found, using free-tier defaults");
                PlanLimits::free_fallback()
            }
            Err(e) => {
                tracing::warn!(plan = name, error = %e, "Plan lookup failed, using free-tier defaults");
                PlanLimits::free_fallback()
            }
        }
    }

    /// Zeroed record for `since`, stamped with the current time.
    fn synthetic_usage(&self, user_id: DbId, since: Timestamp) -> UsageRecord {
        let now = self.clock.now();
        UsageRecord {
            created_at: now,
            updated_at: now,
            ..UsageRecord::zeroed(user_id, since)
        }
    }

    /// Read today's record without creating one.
    async fn peek_today_usage(&self, user_id: DbId) -> Option<UsageRecord> {
        let since = self.clock.day_start();
        match self.store.find_usage_since(user_id, since).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Usage lookup failed");
                None
            }
        }
    }

    async fn fetch_or_create_usage(
        &self,
        user_id: DbId,
        since: Timestamp,
    ) -> Result<UsageRecord, QuotaStoreError> {
        if let Some(record) = self.store.find_usage_since(user_id, since).await? {
            return Ok(record);
        }
        self.store.create_usage(user_id, since).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
