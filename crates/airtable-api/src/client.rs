//! Airtable API HTTP client

use crate::error::{AirtableError, Result};
use crate::types::*;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Client for the Airtable REST API, scoped to one base
pub struct AirtableClient {
    http: reqwest::Client,
    api_key: String,
    base_id: String,
    base_url: String,
}

impl AirtableClient {
    /// Base URL for Airtable API v0
    pub const DEFAULT_BASE_URL: &'static str = "https://api.airtable.com/v0";
    /// Largest page Airtable will return
    pub const PAGE_SIZE: u32 = 100;
    /// Upper bound on pages followed for a single listing
    pub const MAX_PAGES: usize = 100;

    /// Create a new client with default settings (30 second timeout)
    pub fn new(api_key: impl Into<String>, base_id: impl Into<String>) -> Result<Self> {
        Self::with_options(
            api_key,
            base_id,
            Self::DEFAULT_BASE_URL,
            Duration::from_secs(30),
        )
    }

    /// Create a new client against a custom API root and timeout
    pub fn with_options(
        api_key: impl Into<String>,
        base_id: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_id: base_id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// List records in `table`, following pagination until the last page or
    /// until `max_records` records have been collected.
    pub async fn list_records(
        &self,
        table: &str,
        options: &ListRecordsOptions,
    ) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        for page in 0..Self::MAX_PAGES {
            let url = self.list_url(table, options, offset.as_deref())?;
            debug!(table, page, "Fetching Airtable page");

            let response = self
                .http
                .get(url)
                .bearer_auth(&self.api_key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = error_message(&body, status.canonical_reason());
                warn!(table, status = status.as_u16(), message = %message, "Airtable request failed");
                return Err(AirtableError::Status {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response.bytes().await?;
            let data: ListRecordsResponse = serde_json::from_slice(&body)?;
            records.extend(data.records);

            if let Some(max) = options.max_records {
                if records.len() >= max as usize {
                    records.truncate(max as usize);
                    break;
                }
            }

            match data.offset {
                Some(next) => offset = Some(next),
                None => break,
            }

            if page + 1 == Self::MAX_PAGES {
                warn!(table, pages = Self::MAX_PAGES, "Stopped following Airtable pagination");
            }
        }

        debug!(table, count = records.len(), "Fetched Airtable records");
        Ok(records)
    }

    /// Build the list-records URL for one page
    fn list_url(
        &self,
        table: &str,
        options: &ListRecordsOptions,
        offset: Option<&str>,
    ) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| AirtableError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(&self.base_id)
            .push(table);

        {
            let mut query = url.query_pairs_mut();
            for field in &options.fields {
                query.append_pair("fields[]", field);
            }
            for (i, sort) in options.sort.iter().enumerate() {
                query.append_pair(&format!("sort[{}][field]", i), &sort.field);
                query.append_pair(&format!("sort[{}][direction]", i), sort.direction.as_str());
            }

            let page_size = options
                .max_records
                .map_or(Self::PAGE_SIZE, |max| max.clamp(1, Self::PAGE_SIZE));
            query.append_pair("pageSize", &page_size.to_string());

            if let Some(max) = options.max_records {
                query.append_pair("maxRecords", &max.to_string());
            }
            if let Some(view) = &options.view {
                query.append_pair("view", view);
            }
            if let Some(offset) = offset {
                query.append_pair("offset", offset);
            }
        }

        Ok(url)
    }
}

/// Pull a readable message out of an Airtable error body
fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        return parsed.error.describe();
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        reason.unwrap_or("unknown error").to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
