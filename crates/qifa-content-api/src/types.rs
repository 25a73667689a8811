//! Request and response bodies

use crate::config::CacheMode;
use airtable_api::Record;
use serde::{Deserialize, Serialize};
use timed_cache::CacheStats;

/// Body of `POST /api/fetch-airtable-data`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub sort: Option<Vec<SortInput>>,
    #[serde(default)]
    pub max_records: Option<u32>,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub invalidate_cache: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SortInput {
    pub field: String,
    #[serde(default)]
    pub direction: Option<String>,
}

/// Query string of `GET /api/records`
///
/// `fields` and `sort` are comma separated; a `-` prefix on a sort field
/// means descending.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsParams {
    pub table: Option<String>,
    pub fields: Option<String>,
    pub sort: Option<String>,
    pub max_records: Option<u32>,
    pub view: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse<'a> {
    pub records: &'a [Record],
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub success: bool,
    pub message: String,
}

impl InvalidateResponse {
    pub fn invalidated() -> Self {
        Self {
            success: true,
            message: "Cache invalidated".to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache_mode: CacheMode,
    pub cache_ttl_secs: u64,
    pub cache: CacheStats,
}
