//! Process settings read from the environment (after `.env` is loaded).

use crate::db::{PoolConfig, RowCountPolicy};
use crate::error::AppError;
use crate::sql::Dialect;
use std::str::FromStr;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:9000";
pub const DEFAULT_SESSION_SECRET: &str = "AwEsOmE";

#[derive(Clone, Debug)]
pub struct Settings {
    pub pool: PoolConfig,
    pub session_secret: String,
    pub bind_addr: String,
}

fn parsed<T: FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>, AppError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::Config(format!("{}: {}", key, e))),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `DB_USER`, `DB_PASSWORD` and `DB_NAME` are required
    /// unless the driver is sqlite.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let driver: Dialect = parsed("DB_DRIVER", lookup("DB_DRIVER"))?.unwrap_or_default();
        let required = |key: &str| -> Result<String, AppError> {
            match lookup(key) {
                Some(v) => Ok(v),
                None if driver == Dialect::Sqlite => Ok(String::new()),
                None => Err(AppError::Config(format!("{} is required", key))),
            }
        };
        let mut pool = PoolConfig::new(
            driver,
            required("DB_USER")?,
            required("DB_PASSWORD")?,
            required("DB_NAME")?,
        );
        if let Some(host) = lookup("DB_HOST") {
            pool.host = host;
        }
        pool.port = parsed("DB_PORT", lookup("DB_PORT"))?;
        if let Some(charset) = lookup("DB_CHARSET") {
            pool.charset = charset;
        }
        if let Some(v) = parsed::<bool>("DB_AUTOCOMMIT", lookup("DB_AUTOCOMMIT"))? {
            pool.autocommit = v;
        }
        if let Some(v) = parsed("DB_MIN_SIZE", lookup("DB_MIN_SIZE"))? {
            pool.min_size = v;
        }
        if let Some(v) = parsed("DB_MAX_SIZE", lookup("DB_MAX_SIZE"))? {
            pool.max_size = v;
        }
        if let Some(v) = parsed("DB_ACQUIRE_TIMEOUT_SECS", lookup("DB_ACQUIRE_TIMEOUT_SECS"))? {
            pool.acquire_timeout_secs = Some(v);
        }
        if let Some(v) = parsed::<RowCountPolicy>("DB_ROW_COUNT_POLICY", lookup("DB_ROW_COUNT_POLICY"))? {
            pool.row_count_policy = v;
        }
        if pool.is_in_memory() {
            pool.max_size = 1;
            pool.min_size = pool.min_size.min(1);
        }

        Ok(Settings {
            pool,
            session_secret: lookup("SESSION_SECRET").unwrap_or_else(|| DEFAULT_SESSION_SECRET.into()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
        })
    }
}
