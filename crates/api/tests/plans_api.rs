//! Integration tests for `/api/v1/plans`.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, put_json};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn list_plans_returns_seeded_tiers(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/plans").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["free", "pro", "premium"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_plan_by_name(pool: PgPool) {
    let app = common::build_test_app(pool);
    let json = body_json(get(app, "/api/v1/plans/pro").await).await;

    assert_eq!(json["data"]["interviews_per_day"], 20);
    assert_eq!(json["data"]["results_per_day"], 50);
    assert_eq!(json["data"]["retakes_per_day"], 10);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_unknown_plan_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/plans/enterprise").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_limits_applies_only_given_fields(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        "/api/v1/plans/free",
        json!({ "interviews_per_day": 5 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["interviews_per_day"], 5);
    assert_eq!(json["data"]["results_per_day"], 3);

    let app = common::build_test_app(pool);
    let json = body_json(get(app, "/api/v1/plans/free").await).await;
    assert_eq!(json["data"]["interviews_per_day"], 5);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_limits_rejects_below_sentinel(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = put_json(
        app,
        "/api/v1/plans/free",
        json!({ "retakes_per_day": -2 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_limits_rejects_empty_body(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = put_json(app, "/api/v1/plans/free", json!({})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_unknown_plan_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = put_json(
        app,
        "/api/v1/plans/enterprise",
        json!({ "interviews_per_day": 1 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
