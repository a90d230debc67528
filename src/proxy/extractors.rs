use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use super::{ProxyError, SessionState};
use crate::AppState;

/// Authenticated session extractor - decrypts and, when stale, refreshes the
/// session cookie.
///
/// Rejects with `401` when there is no usable session. Handlers must forward
/// `set_cookies` so a refreshed cookie reaches the browser.
pub struct AuthenticatedSession {
    pub session: SessionState,
    pub set_cookies: Vec<String>,
}

impl FromRequestParts<Arc<AppState>> for AuthenticatedSession {
    type Rejection = ProxyError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let loaded = state.proxy.authenticate(&parts.headers).await?;

        tracing::debug!(
            user = %loaded.session.user,
            refreshed = !loaded.set_cookies.is_empty(),
            "Session authenticated via cookie"
        );

        Ok(AuthenticatedSession {
            session: loaded.session,
            set_cookies: loaded.set_cookies,
        })
    }
}
