//! Integration tests for the plan, user and usage repositories.

use chrono::{Duration, TimeZone, Utc};
use intervue_core::plan::ActionType;
use intervue_db::models::subscription_plan::UpdatePlanLimits;
use intervue_db::models::user::{CreateUser, User};
use intervue_db::repositories::{SubscriptionPlanRepo, UsageRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, email: &str, plan: Option<&str>) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            subscription_plan: plan.map(str::to_string),
        },
    )
    .await
    .unwrap()
}

fn midnight() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 9, 22, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn plans_are_seeded(pool: PgPool) {
    let plans = SubscriptionPlanRepo::list(&pool).await.unwrap();
    let names: Vec<&str> = plans.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["free", "pro", "premium"]);

    let premium = SubscriptionPlanRepo::find_by_name(&pool, "premium")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(premium.interviews_per_day, -1);
    assert_eq!(premium.results_per_day, -1);
    assert_eq!(premium.retakes_per_day, -1);
}

#[sqlx::test]
async fn update_limits_applies_only_given_fields(pool: PgPool) {
    let input = UpdatePlanLimits {
        results_per_day: Some(75),
        ..Default::default()
    };
    let updated = SubscriptionPlanRepo::update_limits(&pool, "pro", &input)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.results_per_day, 75);
    assert_eq!(updated.interviews_per_day, 20);
    assert_eq!(updated.retakes_per_day, 10);
}

#[sqlx::test]
async fn update_limits_unknown_plan_returns_none(pool: PgPool) {
    let result = SubscriptionPlanRepo::update_limits(&pool, "gold", &UpdatePlanLimits::default())
        .await
        .unwrap();
    assert!(result.is_none());
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn set_subscription_plan_updates_row(pool: PgPool) {
    let user = new_user(&pool, "a@example.com", None).await;
    assert!(user.subscription_plan.is_none());

    let updated = UserRepo::set_subscription_plan(&pool, user.id, "pro")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.subscription_plan.as_deref(), Some("pro"));

    let missing = UserRepo::set_subscription_plan(&pool, 999_999, "pro")
        .await
        .unwrap();
    assert!(missing.is_none());
}

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn create_for_day_is_idempotent(pool: PgPool) {
    let user = new_user(&pool, "b@example.com", None).await;

    let first = UsageRepo::create_for_day(&pool, user.id, midnight()).await.unwrap();
    let second = UsageRepo::create_for_day(&pool, user.id, midnight()).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.interviews_used, 0);
    assert_eq!(UsageRepo::list_for_user(&pool, user.id, 10).await.unwrap().len(), 1);
}

#[sqlx::test]
async fn find_since_ignores_previous_days(pool: PgPool) {
    let user = new_user(&pool, "c@example.com", None).await;
    let yesterday = midnight() - Duration::days(1);
    UsageRepo::create_for_day(&pool, user.id, yesterday).await.unwrap();

    let found = UsageRepo::find_since(&pool, user.id, midnight()).await.unwrap();
    assert!(found.is_none());

    let today = UsageRepo::create_for_day(&pool, user.id, midnight()).await.unwrap();
    let found = UsageRepo::find_since(&pool, user.id, midnight()).await.unwrap().unwrap();
    assert_eq!(found.id, today.id);
}

#[sqlx::test]
async fn increment_touches_one_counter(pool: PgPool) {
    let user = new_user(&pool, "d@example.com", None).await;
    let row = UsageRepo::create_for_day(&pool, user.id, midnight()).await.unwrap();

    let mut last = row.clone();
    for _ in 0..4 {
        last = UsageRepo::increment(&pool, row.id, ActionType::Results)
            .await
            .unwrap()
            .unwrap();
    }

    assert_eq!(last.results_viewed, 4);
    assert_eq!(last.interviews_used, 0);
    assert_eq!(last.retakes_done, 0);
    assert!(last.updated_at >= row.updated_at);
}

#[sqlx::test]
async fn increment_below_stops_at_cap(pool: PgPool) {
    let user = new_user(&pool, "e@example.com", None).await;
    let row = UsageRepo::create_for_day(&pool, user.id, midnight()).await.unwrap();

    for expected in 1..=2 {
        let updated = UsageRepo::increment_below(&pool, row.id, ActionType::Retakes, 2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.retakes_done, expected);
    }

    let blocked = UsageRepo::increment_below(&pool, row.id, ActionType::Retakes, 2)
        .await
        .unwrap();
    assert!(blocked.is_none());
}

#[sqlx::test]
async fn increment_missing_row_returns_none(pool: PgPool) {
    let result = UsageRepo::increment(&pool, 424_242, ActionType::Interviews)
        .await
        .unwrap();
    assert!(result.is_none());
}
