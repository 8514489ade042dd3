use std::sync::Arc;

use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use sqlx::Postgres;
use tokio::task::JoinHandle;

use crate::config::DatabaseConfig;
use crate::types::{AppError, AppResult};

pub use pool::*;

pub mod pool;

/// Process-wide database handle. Built once in `main` and shared through
/// `AppState`; clones share the same pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    lifecycle: Arc<PoolLifecycle>,
}

impl Database {
    /// Build the pool without opening a connection yet.
    pub fn connect_lazy(config: &DatabaseConfig, lifecycle: Arc<PoolLifecycle>) -> AppResult<Self> {
        let options: PgConnectOptions = config
            .url
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid DATABASE_URL: {}", e)))?;

        Ok(Self::from_options(options, config, lifecycle))
    }

    pub fn from_options(
        options: PgConnectOptions,
        config: &DatabaseConfig,
        lifecycle: Arc<PoolLifecycle>,
    ) -> Self {
        let hook = lifecycle.clone();
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .after_connect(move |_conn, _meta| {
                let hook = hook.clone();
                Box::pin(async move {
                    hook.on_connect();
                    Ok(())
                })
            })
            .connect_lazy_with(options.ssl_mode(PgSslMode::Disable));

        Self { pool, lifecycle }
    }

    /// Borrow a connection; it returns to the pool when dropped.
    pub async fn acquire(&self) -> AppResult<PoolConnection<Postgres>> {
        Ok(self.pool.acquire().await?)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> AppResult<()> {
        Ok(pool::health_check(&self.pool).await?)
    }

    /// Start watching the pool for lost connectivity.
    pub fn spawn_monitor(&self, config: &DatabaseConfig) -> JoinHandle<()> {
        pool::spawn_monitor(self.pool.clone(), self.lifecycle.clone(), config.monitor_interval)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
