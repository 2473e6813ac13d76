use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::models::filters::DEFAULT_CITY_ID;

/// Runtime settings, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root of the backend REST API
    pub api_url: String,
    pub timeout_secs: u64,
    /// JSON file holding the token and saved filters
    pub storage_path: PathBuf,
    pub default_city: String,
}

impl Config {
    /// Load `.env` (if any), then read the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        build_config(|key| std::env::var(key))
    }
}

/// Parse settings through `lookup`, so tests can feed a plain map.
fn build_config<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    };

    let timeout_raw = or_default("LISTING_API_TIMEOUT_SECS", "30");
    let timeout_secs = timeout_raw.trim().parse::<u64>().with_context(|| {
        format!("LISTING_API_TIMEOUT_SECS must be a number, got \"{timeout_raw}\"")
    })?;

    Ok(Config {
        api_url: or_default("LISTING_API_URL", "http://localhost:8000/api"),
        timeout_secs,
        storage_path: PathBuf::from(or_default("LISTING_STORAGE_PATH", "listing-scout.json")),
        default_city: or_default("LISTING_DEFAULT_CITY", DEFAULT_CITY_ID),
    })
}
