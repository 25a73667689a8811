use crate::cache::RecordCache;
use crate::source::RecordSource;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Shared state for the HTTP server, built once in `main`
pub struct ServerState {
    pub source: Arc<dyn RecordSource>,
    pub cache: RecordCache,
    /// Table used when a request names none
    pub default_table: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(
        source: Arc<dyn RecordSource>,
        cache: RecordCache,
        default_table: Option<String>,
    ) -> Self {
        Self {
            source,
            cache,
            default_table,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;
