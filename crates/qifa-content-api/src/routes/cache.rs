use axum::extract::State;
use axum::Json;

use crate::state::SharedState;
use crate::types::InvalidateResponse;

/// Administrative invalidation: the next read of any request refetches
pub async fn invalidate(State(state): State<SharedState>) -> Json<InvalidateResponse> {
    state.cache.invalidate().await;
    Json(InvalidateResponse::invalidated())
}
