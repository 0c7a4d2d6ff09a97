use std::time::Duration;

use anyhow::{Context, Result};

use crate::feed::DEFAULT_BASE_URL;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub cbr_base_url: String,
    pub bind_addr: String,
    pub fetch_timeout: Duration,
    pub max_connections: u32,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let fetch_timeout = match var("FETCH_TIMEOUT_SECS") {
            Some(s) => s
                .parse()
                .with_context(|| format!("Invalid FETCH_TIMEOUT_SECS: {s:?}"))?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        let max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(s) => s
                .parse()
                .with_context(|| format!("Invalid DB_MAX_CONNECTIONS: {s:?}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            cbr_base_url: var("CBR_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            fetch_timeout: Duration::from_secs(fetch_timeout),
            max_connections,
        })
    }
}
