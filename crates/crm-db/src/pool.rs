//! Postgres pool sized for the dictionary refresh.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use crm_core::{Category, Error, Result};

/// One connection per concurrent category read plus one spare, so a full
/// refresh never queues on the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = Category::ALL.len() as u32 + 1;

/// Seconds a category read waits for a free connection.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

const RECYCLE_IDLE_AFTER: Duration = Duration::from_secs(600);
const RECYCLE_OLDER_THAN: Duration = Duration::from_secs(1800);

/// Pool sizing for the category readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Close idle and long-lived connections. Off keeps every connection
    /// open for the pool's whole life, so session state such as TEMP
    /// tables stays visible.
    pub recycle: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            recycle: true,
        }
    }
}

impl PoolConfig {
    /// Read overrides from the environment.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DB_MAX_CONNECTIONS` | `12` | Pool size |
    /// | `DB_ACQUIRE_TIMEOUT_SECS` | `30` | Wait for a free connection |
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("DB_MAX_CONNECTIONS").ok().as_deref(),
            std::env::var("DB_ACQUIRE_TIMEOUT_SECS").ok().as_deref(),
        )
    }

    fn from_vars(max_connections: Option<&str>, acquire_timeout_secs: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            max_connections: positive(max_connections).unwrap_or(defaults.max_connections),
            acquire_timeout: positive(acquire_timeout_secs)
                .map(|secs| Duration::from_secs(secs.into()))
                .unwrap_or(defaults.acquire_timeout),
            recycle: defaults.recycle,
        }
    }

    /// A pool that holds exactly one connection and never replaces it.
    pub fn single_connection() -> Self {
        Self {
            max_connections: 1,
            recycle: false,
            ..Self::default()
        }
    }
}

fn positive(raw: Option<&str>) -> Option<u32> {
    raw?.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

/// Open a pool and wait for its first connection.
pub async fn connect(database_url: &str, config: &PoolConfig) -> Result<PgPool> {
    let start = Instant::now();

    info!(
        subsystem = "database",
        component = "pool",
        op = "create",
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        recycle = config.recycle,
        "Creating database connection pool"
    );

    let options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout);
    let options = if config.recycle {
        options
            .idle_timeout(RECYCLE_IDLE_AFTER)
            .max_lifetime(RECYCLE_OLDER_THAN)
    } else {
        options
            .min_connections(config.max_connections)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    };

    let pool = options
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "database",
        component = "pool",
        op = "established",
        pool_size = pool.size(),
        pool_idle = pool.num_idle(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database connection pool established"
    );
    Ok(pool)
}

/// Log current pool health metrics.
///
/// Warns when no idle connection is left while a refresh may be running.
pub fn log_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle();

    debug!(
        subsystem = "database",
        component = "pool",
        op = "metrics",
        pool_size = size,
        pool_idle = idle,
        "Pool health check"
    );

    if idle == 0 && size > 0 {
        warn!(
            subsystem = "database",
            component = "pool",
            pool_size = size,
            "Connection pool has no idle connections, category reads may queue"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_covers_full_refresh_fanout() {
        assert_eq!(DEFAULT_MAX_CONNECTIONS, 12);
        assert!(DEFAULT_MAX_CONNECTIONS > Category::ALL.len() as u32);
    }

    #[test]
    fn test_env_overrides() {
        let config = PoolConfig::from_vars(Some("20"), Some(" 5 "));
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert!(config.recycle);
    }

    #[test]
    fn test_invalid_env_values_fall_back() {
        for raw in ["0", "-1", "many", ""] {
            assert_eq!(
                PoolConfig::from_vars(Some(raw), Some(raw)),
                PoolConfig::default(),
                "value {raw:?}"
            );
        }
        assert_eq!(PoolConfig::from_vars(None, None), PoolConfig::default());
    }

    #[test]
    fn test_single_connection_is_pinned() {
        let config = PoolConfig::single_connection();
        assert_eq!(config.max_connections, 1);
        assert!(!config.recycle);
    }
}
