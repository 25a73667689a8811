use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderName;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use timed_cache::Lookup;
use tracing::{debug, info};

use crate::cache::RecordSet;
use crate::error::AppError;
use crate::query::RecordQuery;
use crate::state::{ServerState, SharedState};
use crate::types::{FetchRequest, InvalidateResponse, RecordsParams, RecordsResponse};

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// POST /api/fetch-airtable-data
///
/// `{"invalidateCache": true}` clears the cache and never reaches upstream;
/// any other body is a read.
pub async fn fetch_airtable_data(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let request: FetchRequest =
        serde_json::from_slice(&body).map_err(|e| AppError::Parse(e.to_string()))?;

    if request.invalidate_cache {
        state.cache.invalidate().await;
        return Ok(Json(InvalidateResponse::invalidated()).into_response());
    }

    let query = RecordQuery::from_request(request, state.default_table.as_deref())?;
    records_response(&state, &query).await
}

/// GET /api/records
pub async fn list_records(
    State(state): State<SharedState>,
    params: Result<Query<RecordsParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;
    let query = RecordQuery::from_params(params, state.default_table.as_deref())?;
    records_response(&state, &query).await
}

async fn records_response(state: &ServerState, query: &RecordQuery) -> Result<Response, AppError> {
    let (records, from_cache) = fetch_and_cache_records(state, query).await?;
    let cache_header = if from_cache { "HIT" } else { "MISS" };

    Ok((
        [(X_CACHE, cache_header)],
        Json(RecordsResponse {
            records: records.as_slice(),
        }),
    )
        .into_response())
}

/// Serve from cache when fresh, otherwise fetch upstream and store the result.
///
/// The upstream call runs outside the cache lock. A failed fetch leaves the
/// cache as it was, and a fetch that was overtaken by an invalidation is
/// returned to its caller but not stored.
async fn fetch_and_cache_records(
    state: &ServerState,
    query: &RecordQuery,
) -> Result<(RecordSet, bool), AppError> {
    let generation = match state.cache.lookup(query).await {
        Lookup::Hit(records) => {
            debug!(table = %query.table, count = records.len(), "Serving cached records");
            return Ok((records, true));
        }
        Lookup::Miss { generation } => generation,
    };

    let records = Arc::new(state.source.fetch(query).await?);
    state
        .cache
        .store_if_generation(query, records.clone(), generation)
        .await;

    info!(table = %query.table, count = records.len(), "Fetched records from upstream");
    Ok((records, false))
}
