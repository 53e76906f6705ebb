pub mod health;
pub mod plans;
pub mod usage;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /plans                                   list plans
/// /plans/{name}                            get, update limits
///
/// /users/{id}/plan                         assign plan (PUT)
/// /users/{id}/usage                        today's usage summary
/// /users/{id}/usage/{action}               check quota (GET), record usage (POST)
/// /users/{id}/usage/{action}/consume       atomic check-and-record (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/plans", plans::router())
        .nest("/users", usage::router())
}
