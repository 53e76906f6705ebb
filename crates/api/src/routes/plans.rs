//! Route definitions for subscription plans, mounted at `/plans`.

use axum::routing::get;
use axum::Router;

use crate::handlers::plans;
use crate::state::AppState;

/// ```text
/// GET /         -> list_plans
/// GET /{name}   -> get_plan
/// PUT /{name}   -> update_plan_limits
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(plans::list_plans))
        .route(
            "/{name}",
            get(plans::get_plan).put(plans::update_plan_limits),
        )
}
