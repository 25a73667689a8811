//! Error types for the content API

use airtable_api::AirtableError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;

/// Startup errors: configuration, upstream client construction, binding
#[derive(Debug)]
pub enum ServiceError {
    Config(String),
    Upstream(AirtableError),
    Io(Box<std::io::Error>),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Upstream(e) => write!(f, "Upstream client error: {}", e),
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Upstream(e) => Some(e),
            Self::Io(e) => Some(e.as_ref()),
            Self::Config(_) => None,
        }
    }
}

impl From<AirtableError> for ServiceError {
    fn from(e: AirtableError) -> Self {
        Self::Upstream(e)
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(Box::new(e))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ServiceError {
    fn from(e: tracing_subscriber::filter::ParseError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Request errors, converted to HTTP responses
#[derive(Debug)]
pub enum AppError {
    /// Missing or malformed request parameters
    Validation(String),
    /// Request body is not valid JSON for the endpoint
    Parse(String),
    /// The upstream record fetch failed
    Upstream(AirtableError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::Parse(msg) => write!(f, "Invalid request body: {}", msg),
            Self::Upstream(e) => write!(f, "{}", e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Parse(msg) => (StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", msg)),
            AppError::Upstream(e) => {
                tracing::error!(error = %e, "Upstream fetch failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to fetch records".to_string(),
                )
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

impl From<AirtableError> for AppError {
    fn from(e: AirtableError) -> Self {
        AppError::Upstream(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ServiceError::Config("missing AIRTABLE_API_KEY".to_string());
        assert_eq!(format!("{}", err), "Configuration error: missing AIRTABLE_API_KEY");
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AppError::Validation("fields is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_maps_to_bad_request() {
        let response = AppError::Parse("EOF while parsing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_maps_to_bad_gateway() {
        let err = AppError::from(AirtableError::Status {
            status: 503,
            message: "unavailable".to_string(),
        });
        assert!(err.to_string().contains("503"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
