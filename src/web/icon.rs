use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::proxy::{GitHubProvider, ProxyError};
use crate::AppState;

/// Looks up a profile icon for the owner of an access token
#[async_trait]
pub trait IconUrlFetcher: Send + Sync {
    async fn fetch_icon_url(&self, access_token: &str) -> Result<String, ProxyError>;
}

#[async_trait]
impl IconUrlFetcher for GitHubProvider {
    async fn fetch_icon_url(&self, access_token: &str) -> Result<String, ProxyError> {
        self.fetch_avatar_url(access_token).await
    }
}

pub async fn obot_get_icon_url(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let access_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim())
        .filter(|v| !v.is_empty());

    let Some(access_token) = access_token else {
        return (StatusCode::BAD_REQUEST, "missing access token").into_response();
    };

    match state.icon_fetcher.fetch_icon_url(access_token).await {
        Ok(icon_url) => Json(json!({ "iconURL": icon_url })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Icon lookup failed");
            (
                StatusCode::BAD_REQUEST,
                format!("failed to fetch icon URL: {}", e),
            )
                .into_response()
        }
    }
}
