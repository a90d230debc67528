//! Session state introspection
//!
//! The caller forwards the relevant parts of a browser request; the handler decrypts
//! that request's session cookie and reports what it holds.

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::proxy::{LoadedSession, OAuthProxy, ProxyError};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub header: HashMap<String, HeaderValues>,
}

/// Header values as sent by the caller: a list per name, or a single string
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValues {
    Many(Vec<String>),
    One(String),
}

impl HeaderValues {
    fn as_slice(&self) -> &[String] {
        match self {
            HeaderValues::Many(values) => values,
            HeaderValues::One(value) => std::slice::from_ref(value),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableState {
    pub expires_on: Option<DateTime<Utc>>,
    pub access_token: String,
    pub preferred_username: String,
    pub user: String,
    pub email: String,
    pub set_cookies: Vec<String>,
}

pub async fn obot_get_state(State(state): State<Arc<AppState>>, body: String) -> Response {
    let request: SerializableRequest = match serde_json::from_str(&body) {
        Ok(r) => r,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("failed to decode request body: {}", e),
            )
                .into_response()
        }
    };

    match serializable_state(&state.proxy, &request).await {
        Ok(ss) => Json(ss).into_response(),
        Err(e) => {
            tracing::debug!(error = %e, method = %request.method, url = %request.url, "State lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Resolve the session carried by a forwarded request
pub async fn serializable_state(
    proxy: &OAuthProxy,
    request: &SerializableRequest,
) -> anyhow::Result<SerializableState> {
    let headers = header_map(&request.header)?;

    let session = proxy
        .load_cookied_session(&headers)
        .map_err(|e| anyhow::anyhow!("failed to load cookied session: {}", e))?;

    let refresh = proxy.options().cookie.refresh;
    let LoadedSession {
        session,
        set_cookies,
    } = if session.needs_refresh(refresh, Utc::now()) {
        proxy
            .refresh_session(session)
            .await
            .map_err(|e: ProxyError| anyhow::anyhow!("failed to refresh token: {}", e))?
    } else {
        LoadedSession {
            session,
            set_cookies: Vec::new(),
        }
    };

    Ok(SerializableState {
        expires_on: session.expires_on,
        access_token: session.access_token,
        preferred_username: session.preferred_username,
        user: session.user,
        email: session.email,
        set_cookies,
    })
}

fn header_map(raw: &HashMap<String, HeaderValues>) -> anyhow::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, values) in raw {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid header name {:?}: {}", name, e))?;
        for value in values.as_slice() {
            let value = HeaderValue::from_str(value)
                .map_err(|e| anyhow::anyhow!("invalid value for header {}: {}", name, e))?;
            headers.append(name.clone(), value);
        }
    }
    Ok(headers)
}
