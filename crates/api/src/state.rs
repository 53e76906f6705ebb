use std::sync::Arc;

use intervue_core::usage_quota::QuotaGate;
use intervue_db::PgQuotaStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything heavy is behind `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: intervue_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Daily usage quota gate backed by the same pool.
    pub quota: Arc<QuotaGate<PgQuotaStore>>,
}

impl AppState {
    pub fn new(pool: intervue_db::DbPool, config: ServerConfig) -> Self {
        let store = PgQuotaStore::new(pool.clone(), config.retry.clone());
        Self {
            pool,
            config: Arc::new(config),
            quota: Arc::new(QuotaGate::new(store)),
        }
    }
}
