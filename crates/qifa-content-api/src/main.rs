//! Qifa Planet content API
//!
//! Serves quote, episode and workshop records from Airtable, keeping
//! recently fetched record sets in a time-boxed cache that writers can
//! invalidate explicitly.

mod cache;
mod config;
mod error;
mod query;
mod routes;
mod server;
mod source;
mod state;
mod types;

use crate::cache::RecordCache;
use crate::config::Config;
use crate::error::Result;
use crate::server::{cors_layer, start_server};
use crate::state::{ServerState, SharedState};
use airtable_api::AirtableClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("qifa_content_api=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Qifa content API...");

    let config = Config::from_env()?;
    info!("Port: {}", config.port);
    info!("Airtable base: {}", config.airtable_base_id);
    info!("Cache mode: {}", config.cache_mode);
    info!("Cache TTL: {} seconds", config.cache_ttl_secs);

    let client = AirtableClient::with_options(
        config.airtable_api_key.clone(),
        config.airtable_base_id.clone(),
        config.airtable_api_url.clone(),
        Duration::from_secs(config.upstream_timeout_secs),
    )?;

    let cache = RecordCache::new(
        config.cache_mode,
        Duration::from_secs(config.cache_ttl_secs),
        config.cache_max_entries,
    );

    let state: SharedState = Arc::new(ServerState::new(
        Arc::new(client),
        cache,
        config.default_table.clone(),
    ));

    start_server(state, config.port, cors_layer(&config.cors_origins))
        .await?;

    Ok(())
}
