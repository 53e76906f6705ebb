//! Handlers for daily usage quotas.
//!
//! Callers gate an action with `GET .../usage/{action}` before performing it
//! and record it with `POST .../usage/{action}` afterwards. The quota
//! endpoints never fail because of store trouble: the gate fails open. Use
//! `POST .../usage/{action}/consume` to check and record in one step without
//! the overshoot window between the two calls.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use intervue_core::error::CoreError;
use intervue_core::plan::ActionType;
use intervue_core::types::DbId;
use intervue_db::models::user::AssignPlan;
use intervue_db::repositories::{SubscriptionPlanRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn parse_action(raw: &str) -> AppResult<ActionType> {
    ActionType::parse(raw).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unknown action '{raw}', expected one of: interviews, results, retakes"
        ))
    })
}

/// PUT /api/v1/users/{id}/plan
///
/// Assign a subscription plan. The plan must exist.
pub async fn assign_plan(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<AssignPlan>,
) -> AppResult<impl IntoResponse> {
    if SubscriptionPlanRepo::find_by_name(&state.pool, &input.plan)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest(format!("Unknown plan '{}'", input.plan)));
    }

    let user = UserRepo::set_subscription_plan(&state.pool, user_id, &input.plan)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;

    tracing::info!(user_id, plan = %input.plan, "Subscription plan assigned");

    Ok(Json(DataResponse { data: user }))
}

/// GET /api/v1/users/{id}/usage
///
/// Today's plan, limits and counters for every action category.
pub async fn get_usage_summary(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;

    let summary = state.quota.usage_summary(user_id).await;
    Ok(Json(DataResponse { data: summary }))
}

/// GET /api/v1/users/{id}/usage/{action}
///
/// Whether one more unit of `action` is allowed today.
pub async fn check_quota(
    State(state): State<AppState>,
    Path((user_id, action)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let action = parse_action(&action)?;
    let status = state.quota.check_action(user_id, action).await;
    Ok(Json(DataResponse { data: status }))
}

/// POST /api/v1/users/{id}/usage/{action}
///
/// Record one unit of `action` after the gated operation succeeded.
pub async fn record_usage(
    State(state): State<AppState>,
    Path((user_id, action)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let action = parse_action(&action)?;
    let record = state.quota.increment_usage(user_id, action).await;
    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/users/{id}/usage/{action}/consume
///
/// Check and record in one conditional update. Responds 429 with the plan,
/// limit and usage when today's quota is used up.
pub async fn consume_quota(
    State(state): State<AppState>,
    Path((user_id, action)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let action = parse_action(&action)?;
    let status = state.quota.try_consume(user_id, action).await;
    if !status.allowed {
        return Err(AppError::QuotaExceeded(status));
    }
    Ok(Json(DataResponse { data: status }))
}
