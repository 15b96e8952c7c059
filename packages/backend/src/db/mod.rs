pub mod config;
pub mod migrate;

use std::sync::Arc;
use std::time::Instant;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

pub use config::{DbConfig, DbConfigError};

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error(transparent)]
    Config(#[from] DbConfigError),
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),
}

/// Result of a liveness probe against the primary pool.
#[derive(Debug, Clone)]
pub struct PrimaryStatus {
    pub healthy: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

pub struct DatabaseProxy {
    config: DbConfig,
    pool: PgPool,
}

impl DatabaseProxy {
    /// Builds the pool from environment configuration. Failures surface here
    /// so the caller can decide whether to keep serving without a database.
    pub async fn from_env() -> Result<Arc<Self>, DbInitError> {
        let config = DbConfig::from_env()?;
        Self::connect(config).await
    }

    pub async fn connect(config: DbConfig) -> Result<Arc<Self>, DbInitError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(DbInitError::Connect)?;

        Ok(Arc::new(Self { config, pool }))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// One-shot probe used by the health endpoints. Never blocks past the
    /// configured ping timeout.
    pub async fn primary_status(&self) -> PrimaryStatus {
        let started = Instant::now();
        let probe = sqlx::query("SELECT 1").execute(&self.pool);
        match tokio::time::timeout(self.config.ping_timeout, probe).await {
            Ok(Ok(_)) => PrimaryStatus {
                healthy: true,
                latency_ms: Some(started.elapsed().as_millis() as u64),
                error: None,
            },
            Ok(Err(err)) => PrimaryStatus {
                healthy: false,
                latency_ms: None,
                error: Some(err.to_string()),
            },
            Err(_) => PrimaryStatus {
                healthy: false,
                latency_ms: None,
                error: Some("timeout".to_string()),
            },
        }
    }
}
