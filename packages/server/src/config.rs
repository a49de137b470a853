use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Where scrape jobs, results and websites are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Direct Postgres connection (migrations run at startup)
    Postgres { database_url: String },
    /// Hosted PostgREST endpoint (Supabase project URL + service key)
    Rest { url: String, service_key: String },
}

/// Tunables for job execution and polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeSettings {
    /// Upper bound on a single site's scrape attempt
    pub scrape_timeout: Duration,
    /// How many sites of one job are scraped at the same time
    pub max_concurrent_scrapes: usize,
    pub poll_interval: Duration,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            scrape_timeout: Duration::from_secs(15),
            max_concurrent_scrapes: 5,
            poll_interval: Duration::from_millis(2000),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub port: u16,
    pub settings: ScrapeSettings,
    /// Resume jobs left `in_progress` by a previous process
    pub recover_on_startup: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match var("DATABASE_URL").filter(|v| !v.is_empty()) {
            Some(database_url) => StoreConfig::Postgres { database_url },
            None => {
                let url = var("SUPABASE_URL").filter(|v| !v.is_empty());
                let service_key = var("SUPABASE_SERVICE_KEY").filter(|v| !v.is_empty());
                match (url, service_key) {
                    (Some(url), Some(service_key)) => StoreConfig::Rest { url, service_key },
                    (Some(_), None) => bail!("SUPABASE_SERVICE_KEY must be set"),
                    (None, _) => {
                        bail!("either DATABASE_URL or SUPABASE_URL + SUPABASE_SERVICE_KEY must be set")
                    }
                }
            }
        };

        let defaults = ScrapeSettings::default();
        let timeout_secs: u64 =
            parse_or(&var, "SCRAPE_TIMEOUT_SECS", defaults.scrape_timeout.as_secs())?;
        let max_concurrent: usize = parse_or(&var, "MAX_CONCURRENT_SCRAPES", defaults.max_concurrent_scrapes)?;
        let poll_ms: u64 =
            parse_or(&var, "POLL_INTERVAL_MS", defaults.poll_interval.as_millis() as u64)?;

        if timeout_secs == 0 {
            bail!("SCRAPE_TIMEOUT_SECS must be at least 1");
        }
        if max_concurrent == 0 {
            bail!("MAX_CONCURRENT_SCRAPES must be at least 1");
        }
        if poll_ms == 0 {
            bail!("POLL_INTERVAL_MS must be at least 1");
        }

        Ok(Self {
            store,
            port: parse_or(&var, "PORT", 8080)?,
            settings: ScrapeSettings {
                scrape_timeout: Duration::from_secs(timeout_secs),
                max_concurrent_scrapes: max_concurrent,
                poll_interval: Duration::from_millis(poll_ms),
            },
            recover_on_startup: parse_or(&var, "RECOVER_ON_STARTUP", true)?,
        })
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid value, got {:?}", key, raw)),
        None => Ok(default),
    }
}
