use axum::extract::State;
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::AppState;

/// Root - reports the local base URL for liveness and self-discovery
pub async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.local_url.clone()
}
