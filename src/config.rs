// src/config.rs

use anyhow::{Context, Result};
use std::{env, str::FromStr, time::Duration};

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Registry CSV location. Absence is reported per request, not at startup.
    pub index_csv: Option<String>,
    pub port: u16,
    pub log_level: String,
    pub fetch_timeout: Duration,
    pub fetch_concurrency: usize,
    pub fetch_retries: u32,
    pub fetch_backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_csv: None,
            port: 8080,
            log_level: "info".into(),
            fetch_timeout: Duration::from_secs(30),
            fetch_concurrency: 4,
            fetch_retries: 0,
            fetch_backoff_ms: 500,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any key → value source; unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Ok(Self {
            index_csv: get("INDEX_CSV"),
            port: parse_var(get("PORT"), "PORT", defaults.port)?,
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            fetch_timeout: Duration::from_secs(parse_var(
                get("FETCH_TIMEOUT_SECS"),
                "FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )?),
            fetch_concurrency: parse_var(
                get("FETCH_CONCURRENCY"),
                "FETCH_CONCURRENCY",
                defaults.fetch_concurrency,
            )?
            .max(1),
            fetch_retries: parse_var(get("FETCH_RETRIES"), "FETCH_RETRIES", defaults.fetch_retries)?,
            fetch_backoff_ms: parse_var(
                get("FETCH_BACKOFF_MS"),
                "FETCH_BACKOFF_MS",
                defaults.fetch_backoff_ms,
            )?,
        })
    }
}

fn parse_var<T>(value: Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid {} value {:?}", name, raw)),
        None => Ok(default),
    }
}
