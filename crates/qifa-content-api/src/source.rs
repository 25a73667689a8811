//! Upstream record sources

use crate::query::RecordQuery;
use airtable_api::{AirtableClient, Record};
use async_trait::async_trait;

/// Where record sets come from on a cache miss
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, query: &RecordQuery) -> airtable_api::Result<Vec<Record>>;
}

#[async_trait]
impl RecordSource for AirtableClient {
    async fn fetch(&self, query: &RecordQuery) -> airtable_api::Result<Vec<Record>> {
        self.list_records(&query.table, &query.list_options()).await
    }
}
