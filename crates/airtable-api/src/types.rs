//! Airtable API types

use serde::{Deserialize, Serialize};

/// A single Airtable record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// One page of the list-records endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ListRecordsResponse {
    #[serde(default)]
    pub records: Vec<Record>,
    /// Cursor for the next page, absent on the last page
    pub offset: Option<String>,
}

/// Error body returned by Airtable on failure.
///
/// `error` is usually an object, but some endpoints return a bare string.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Detailed {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
    },
    Code(String),
}

impl ErrorBody {
    pub fn describe(&self) -> String {
        match self {
            Self::Detailed {
                error_type,
                message,
            } => match (error_type, message) {
                (Some(t), Some(m)) => format!("{}: {}", t, m),
                (None, Some(m)) => m.clone(),
                (Some(t), None) => t.clone(),
                (None, None) => "unknown error".to_string(),
            },
            Self::Code(code) => code.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Options for listing records
#[derive(Debug, Clone, Default)]
pub struct ListRecordsOptions {
    /// Only these fields are returned. Empty means all fields.
    pub fields: Vec<String>,
    pub sort: Vec<SortSpec>,
    /// Stop after this many records, across pages
    pub max_records: Option<u32>,
    pub view: Option<String>,
}
