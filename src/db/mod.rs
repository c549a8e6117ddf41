pub mod config;
pub mod health;
pub mod migrate;
pub mod operations;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::db::config::{DbConfig, DbConfigError};
use crate::db::health::{HealthCheckResult, HealthSnapshot, HealthTracker};

/// Shared PostgreSQL handle. Built once at startup, cloned into request
/// handlers through `AppState`, and probed by a background health loop that
/// `/health` reports from.
#[derive(Clone)]
pub struct Database {
    config: DbConfig,
    pool: PgPool,
    health: Arc<RwLock<HealthTracker>>,
}

impl Database {
    pub async fn from_env() -> Result<Arc<Self>, DbInitError> {
        let config = DbConfig::from_env()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(DbInitError::Sqlx)?;

        migrate::run_migrations(&pool)
            .await
            .map_err(DbInitError::Migration)?;

        let db = Arc::new(Self {
            health: Arc::new(RwLock::new(HealthTracker::new())),
            config,
            pool,
        });

        // Seed the tracker before the loop starts so /health never reports
        // degraded on a freshly connected pool.
        let initial = db.check_health().await;
        {
            let mut tracker = db.health.write().await;
            tracker.process(initial);
        }

        db.start_health_monitor();

        Ok(db)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_status(&self) -> HealthSnapshot {
        let tracker = self.health.read().await;
        tracker.snapshot()
    }

    fn start_health_monitor(self: &Arc<Self>) {
        let db = Arc::clone(self);
        tokio::spawn(async move {
            db.health_monitor_loop().await;
        });
    }

    async fn health_monitor_loop(self: Arc<Self>) {
        let interval = self.config.health_check.interval;

        loop {
            let start = tokio::time::Instant::now();
            let result = self.check_health().await;
            {
                let mut tracker = self.health.write().await;
                tracker.process(result);
            }

            let elapsed = start.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
    }

    async fn check_health(&self) -> HealthCheckResult {
        let timeout = self.config.health_check.timeout;
        let pool = self.pool.clone();

        let started = std::time::Instant::now();
        let result = tokio::time::timeout(timeout, sqlx::query("SELECT 1").execute(&pool)).await;

        match result {
            Ok(Ok(_)) => HealthCheckResult::healthy(started.elapsed()),
            Ok(Err(err)) => HealthCheckResult::unhealthy(err.to_string()),
            Err(_) => HealthCheckResult::unhealthy("timeout".to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error(transparent)]
    Config(#[from] DbConfigError),
    #[error(transparent)]
    Sqlx(sqlx::Error),
    #[error(transparent)]
    Migration(migrate::MigrationError),
}
