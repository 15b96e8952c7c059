use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbConfigError {
    #[error("missing required environment variable: {key}")]
    Missing { key: &'static str },
}

/// Connection settings for the Postgres pool. `DATABASE_URL` is the only
/// required variable; everything else has a serving default.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub ping_timeout: Duration,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, DbConfigError> {
        let url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(DbConfigError::Missing {
                key: "DATABASE_URL",
            })?;

        Ok(Self {
            url,
            max_connections: env_u32("DB_MAX_CONNECTIONS", 10),
            acquire_timeout: Duration::from_millis(env_u64("DB_ACQUIRE_TIMEOUT_MS", 5_000)),
            ping_timeout: Duration::from_millis(env_u64("DB_PING_TIMEOUT_MS", 3_000)),
        })
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
