//! Postgres persistence for the quota service.

use std::future::Future;
use std::time::Duration;

use intervue_core::retry::UnconditionalBackoffRetry;
use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::Connection;

pub mod models;
pub mod quota_store;
pub mod repositories;

pub use quota_store::PgQuotaStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Run `query_fn` against a fresh connection, retrying any failure.
///
/// Each attempt opens a new [`PgConnection`] from `connection_string`, so a
/// broken connection is never reused. Connect errors and query errors are
/// treated alike. The delay starts at `delay` and doubles after every failed
/// attempt; `retries` is the total number of attempts.
pub async fn execute_with_retry<F, Fut, T>(
    connection_string: &str,
    query_fn: F,
    retries: u32,
    delay: Duration,
) -> Result<T, sqlx::Error>
where
    F: Fn(PgConnection) -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let query_fn = &query_fn;
    UnconditionalBackoffRetry::new(retries, delay)
        .run(move || async move {
            let conn = PgConnection::connect(connection_string).await?;
            query_fn(conn).await
        })
        .await
}
