use std::str::FromStr;
use std::time::Duration;

use crate::error::GuardError;

/// Largest accepted freshness window (about 31 years).
pub const MAX_REPORT_AGE_SECS: u64 = 1_000_000_000;

/// Guard configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub database_url: String,
    /// Connection pool size (default: `10`).
    pub db_max_connections: u32,
    /// How often the feed polls for new reports (default: 1s).
    pub poll_interval: Duration,
    /// Maximum reports fetched per poll (default: `100`).
    pub feed_batch_size: i64,
    /// Capacity of the feed -> ingestion channel (default: `256`).
    pub ingest_queue_capacity: usize,
    /// Reports older than this are not analysed. `0` disables the check.
    pub report_max_age_secs: u64,
    /// Lifetime of a machine cache entry (default: 30s).
    pub machine_cache_ttl: Duration,
}

impl GuardConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                  | Default  |
    /// |--------------------------|----------|
    /// | `DATABASE_URL`           | required |
    /// | `DB_MAX_CONNECTIONS`     | `10`     |
    /// | `POLL_INTERVAL_MS`       | `1000`   |
    /// | `FEED_BATCH_SIZE`        | `100`    |
    /// | `INGEST_QUEUE_CAPACITY`  | `256`    |
    /// | `REPORT_MAX_AGE_SECS`    | `10`     |
    /// | `MACHINE_CACHE_TTL_SECS` | `30`     |
    pub fn from_env() -> Result<Self, GuardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GuardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| GuardError::Config("DATABASE_URL must be set".into()))?;

        let db_max_connections: u32 = parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?;
        let poll_interval_ms: u64 = parse_or(&lookup, "POLL_INTERVAL_MS", 1000)?;
        let feed_batch_size: i64 = parse_or(&lookup, "FEED_BATCH_SIZE", 100)?;
        let ingest_queue_capacity: usize = parse_or(&lookup, "INGEST_QUEUE_CAPACITY", 256)?;
        let report_max_age_secs: u64 = parse_or(&lookup, "REPORT_MAX_AGE_SECS", 10)?;
        let machine_cache_ttl_secs: u64 = parse_or(&lookup, "MACHINE_CACHE_TTL_SECS", 30)?;

        if db_max_connections == 0 {
            return Err(GuardError::Config("DB_MAX_CONNECTIONS must be positive".into()));
        }
        if poll_interval_ms == 0 {
            return Err(GuardError::Config("POLL_INTERVAL_MS must be positive".into()));
        }
        if feed_batch_size <= 0 {
            return Err(GuardError::Config("FEED_BATCH_SIZE must be positive".into()));
        }
        if ingest_queue_capacity == 0 {
            return Err(GuardError::Config("INGEST_QUEUE_CAPACITY must be positive".into()));
        }
        if report_max_age_secs > MAX_REPORT_AGE_SECS {
            return Err(GuardError::Config(format!(
                "REPORT_MAX_AGE_SECS must be at most {MAX_REPORT_AGE_SECS}"
            )));
        }

        Ok(Self {
            database_url,
            db_max_connections,
            poll_interval: Duration::from_millis(poll_interval_ms),
            feed_batch_size,
            ingest_queue_capacity,
            report_max_age_secs,
            machine_cache_ttl: Duration::from_secs(machine_cache_ttl_secs),
        })
    }

    /// The freshness window, or `None` when disabled.
    pub fn report_max_age(&self) -> Option<chrono::Duration> {
        match self.report_max_age_secs {
            0 => None,
            secs => chrono::Duration::try_seconds(secs.min(MAX_REPORT_AGE_SECS) as i64),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, GuardError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| GuardError::Config(format!("{key} must be a valid number, got {raw:?}"))),
    }
}
