use crate::error::{Result, ServiceError};
use serde::Serialize;
use std::env;
use std::fmt;
use std::str::FromStr;

/// How cached record sets are keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// One entry per normalized request (table, fields, sort, limit, view)
    Request,
    /// One entry shared by every request, whatever it asked for
    Single,
}

impl FromStr for CacheMode {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "request" => Ok(Self::Request),
            "single" => Ok(Self::Single),
            other => Err(ServiceError::Config(format!(
                "CACHE_MODE must be \"request\" or \"single\", got {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Single => write!(f, "single"),
        }
    }
}

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub airtable_api_key: String,
    pub airtable_base_id: String,
    pub airtable_api_url: String,
    pub default_table: Option<String>,
    pub upstream_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_mode: CacheMode,
    pub cache_max_entries: usize,
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(3005);

        let airtable_api_key = non_empty("AIRTABLE_API_KEY")
            .ok_or_else(|| ServiceError::Config("missing AIRTABLE_API_KEY".to_string()))?;

        let airtable_base_id = non_empty("AIRTABLE_BASE_ID")
            .ok_or_else(|| ServiceError::Config("missing AIRTABLE_BASE_ID".to_string()))?;

        let airtable_api_url = non_empty("AIRTABLE_API_URL")
            .unwrap_or_else(|| airtable_api::AirtableClient::DEFAULT_BASE_URL.to_string());

        let default_table = non_empty("AIRTABLE_DEFAULT_TABLE").map(|t| t.trim().to_string());

        let upstream_timeout_secs = lookup("UPSTREAM_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let cache_ttl_secs = lookup("CACHE_TTL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(5 * 60); // 5 minutes default

        let cache_mode = match non_empty("CACHE_MODE") {
            Some(mode) => mode.parse()?,
            None => CacheMode::Request,
        };

        let cache_max_entries = lookup("CACHE_MAX_ENTRIES")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(256);

        let cors_origins = non_empty("CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        Ok(Self {
            port,
            airtable_api_key,
            airtable_base_id,
            airtable_api_url,
            default_table,
            upstream_timeout_secs,
            cache_ttl_secs,
            cache_mode,
            cache_max_entries,
            cors_origins,
        })
    }
}
