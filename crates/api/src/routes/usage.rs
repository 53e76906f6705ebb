//! Route definitions for per-user plan assignment and usage quotas,
//! mounted at `/users`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::usage;
use crate::state::AppState;

/// ```text
/// PUT  /{id}/plan                      -> assign_plan
/// GET  /{id}/usage                     -> get_usage_summary
/// GET  /{id}/usage/{action}            -> check_quota
/// POST /{id}/usage/{action}            -> record_usage
/// POST /{id}/usage/{action}/consume    -> consume_quota
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/plan", put(usage::assign_plan))
        .route("/{id}/usage", get(usage::get_usage_summary))
        .route(
            "/{id}/usage/{action}",
            get(usage::check_quota).post(usage::record_usage),
        )
        .route("/{id}/usage/{action}/consume", post(usage::consume_quota))
}
