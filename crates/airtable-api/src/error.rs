//! Error types for Airtable API client

use std::fmt;

/// Errors that can occur when interacting with the Airtable API
#[derive(Debug)]
pub enum AirtableError {
    /// HTTP request failed
    Http(reqwest::Error),
    /// Failed to parse JSON response
    Json(serde_json::Error),
    /// Failed to build the request URL
    Url(url::ParseError),
    /// Airtable answered with a non-success status
    Status { status: u16, message: String },
}

impl fmt::Display for AirtableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "Airtable HTTP error: {}", e),
            Self::Json(e) => write!(f, "Airtable JSON parse error: {}", e),
            Self::Url(e) => write!(f, "Airtable URL error: {}", e),
            Self::Status { status, message } => {
                write!(f, "Airtable returned status {}: {}", status, message)
            }
        }
    }
}

impl std::error::Error for AirtableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Url(e) => Some(e),
            Self::Status { .. } => None,
        }
    }
}

impl From<reqwest::Error> for AirtableError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for AirtableError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<url::ParseError> for AirtableError {
    fn from(e: url::ParseError) -> Self {
        Self::Url(e)
    }
}

/// Result type for Airtable API operations
pub type Result<T> = std::result::Result<T, AirtableError>;
