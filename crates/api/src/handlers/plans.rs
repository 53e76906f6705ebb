//! Handlers for subscription plan reference data.
//!
//! Plans are seeded by migration; the only mutation is the administrative
//! limit update.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use intervue_db::models::subscription_plan::UpdatePlanLimits;
use intervue_db::repositories::SubscriptionPlanRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/plans
pub async fn list_plans(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let plans = SubscriptionPlanRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: plans }))
}

/// GET /api/v1/plans/{name}
pub async fn get_plan(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let plan = SubscriptionPlanRepo::find_by_name(&state.pool, &name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan '{name}' not found")))?;

    Ok(Json(DataResponse { data: plan }))
}

/// PUT /api/v1/plans/{name}
///
/// Partially update a plan's daily limits. `-1` marks a category unlimited.
pub async fn update_plan_limits(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(input): Json<UpdatePlanLimits>,
) -> AppResult<impl IntoResponse> {
    if input.is_empty() {
        return Err(AppError::BadRequest(
            "At least one limit must be provided".to_string(),
        ));
    }
    input.validate()?;

    let plan = SubscriptionPlanRepo::update_limits(&state.pool, &name, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan '{name}' not found")))?;

    tracing::info!(
        plan = %plan.name,
        interviews_per_day = plan.interviews_per_day,
        results_per_day = plan.results_per_day,
        retakes_per_day = plan.retakes_per_day,
        "Plan limits updated",
    );

    Ok(Json(DataResponse { data: plan }))
}
