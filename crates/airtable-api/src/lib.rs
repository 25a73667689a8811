//! Rust client for the Airtable REST API
//!
//! Covers the one endpoint the content service needs: listing the records of
//! a table, with field selection, sorting, views and transparent pagination.
//!
//! # Example
//!
//! ```no_run
//! use airtable_api::{AirtableClient, ListRecordsOptions, SortDirection, SortSpec};
//!
//! # async fn example() -> Result<(), airtable_api::AirtableError> {
//! let client = AirtableClient::new("patXXXX", "appXXXX")?;
//!
//! let options = ListRecordsOptions {
//!     fields: vec!["content".into(), "author".into()],
//!     sort: vec![SortSpec { field: "date".into(), direction: SortDirection::Desc }],
//!     ..Default::default()
//! };
//! for record in client.list_records("Quotes", &options).await? {
//!     println!("{} {:?}", record.id, record.fields.get("content"));
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod types;

pub use client::AirtableClient;
pub use error::{AirtableError, Result};
pub use types::{
    ErrorBody, ErrorResponse, ListRecordsOptions, ListRecordsResponse, Record, SortDirection,
    SortSpec,
};
