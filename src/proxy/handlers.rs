//! Proxy engine HTTP handlers
//!
//! - `start_handler`: initiates the GitHub authorization code flow
//! - `callback_handler`: code exchange, restriction checks, session cookie
//! - `sign_out_handler`: clears the session
//! - `auth_handler` / `userinfo_handler`: session probes for other services
//! - `proxy_fallback`: everything outside the proxy prefix

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::extractors::AuthenticatedSession;
use super::helpers::{build_sign_in_url, redirect_target, token_fingerprint};
use super::ProxyError;
use crate::AppState;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub rd: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user: String,
    pub email: String,
    pub preferred_username: String,
}

/// Routes served under the proxy prefix
pub fn routes(proxy_prefix: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(&format!("{}/start", proxy_prefix), get(start_handler))
        .route(&format!("{}/callback", proxy_prefix), get(callback_handler))
        .route(
            &format!("{}/sign_out", proxy_prefix),
            get(sign_out_handler).post(sign_out_handler),
        )
        .route(&format!("{}/auth", proxy_prefix), get(auth_handler))
        .route(&format!("{}/userinfo", proxy_prefix), get(userinfo_handler))
}

// =============================================================================
// Internal Helpers
// =============================================================================

/// Append `Set-Cookie` headers, failing instead of panicking on malformed values
fn append_set_cookies(response: &mut Response, cookies: &[String]) -> Result<(), ProxyError> {
    for cookie in cookies {
        let value = HeaderValue::from_str(cookie).map_err(|e| {
            tracing::error!(
                error = %e,
                value_len = cookie.len(),
                "Failed to create Set-Cookie header"
            );
            ProxyError::Internal("failed to set session cookie".to_string())
        })?;
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    Ok(())
}

fn with_cookies(mut response: Response, cookies: &[String]) -> Response {
    match append_set_cookies(&mut response, cookies) {
        Ok(()) => response,
        Err(e) => e.into_response(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Start handler - stores CSRF state and redirects to GitHub
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let rd = redirect_target(query.rd.as_deref(), &state.proxy.origin());
    let (auth_url, csrf_token) = state.proxy.provider().authorize_url();
    let csrf_cookie = state.proxy.cookies().csrf_cookie(csrf_token.secret(), &rd);

    tracing::info!(
        event = "login_start",
        rd = %rd,
        scope = %state.proxy.provider().scope(),
        "Redirecting to GitHub for authentication"
    );

    with_cookies(Redirect::to(auth_url.as_str()).into_response(), &[csrf_cookie])
}

/// Callback handler - exchanges the code and issues the session cookie
///
/// The CSRF cookie is single use and is cleared whether or not login succeeds.
pub async fn callback_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Response {
    let clear_csrf = state.proxy.cookies().clear_csrf_cookie();
    match complete_login(&state, params, &headers).await {
        Ok(response) => with_cookies(response, &[clear_csrf]),
        Err(e) => with_cookies(e.into_response(), &[clear_csrf]),
    }
}

async fn complete_login(
    state: &AppState,
    params: CallbackParams,
    headers: &HeaderMap,
) -> Result<Response, ProxyError> {
    if let Some(error) = params.error {
        tracing::warn!(
            error = %error,
            description = ?params.error_description,
            "OAuth authorization failed"
        );
        return Err(ProxyError::Forbidden(match params.error_description {
            Some(desc) => format!("{}: {}", error, desc),
            None => error,
        }));
    }

    // CSRF Protection: state parameter must match the sealed cookie
    let Some(callback_state) = params.state else {
        tracing::warn!("CSRF validation failed: No state parameter in callback");
        return Err(ProxyError::Forbidden("missing state parameter".to_string()));
    };
    let Some((stored_state, rd)) = state.proxy.cookies().load_csrf(headers) else {
        tracing::warn!(
            has_cookie_header = headers.get("cookie").is_some(),
            "CSRF validation failed: No CSRF cookie found"
        );
        return Err(ProxyError::Forbidden(
            "CSRF validation failed: missing state cookie".to_string(),
        ));
    };
    if callback_state != stored_state {
        tracing::warn!("CSRF validation failed: State mismatch (callback vs cookie)");
        return Err(ProxyError::Forbidden(
            "CSRF validation failed: state mismatch".to_string(),
        ));
    }

    let Some(code) = params.code else {
        return Err(ProxyError::BadRequest("missing authorization code".to_string()));
    };

    let provider = state.proxy.provider();
    let mut session = provider.redeem(code).await?;
    provider.enrich_session(&mut session).await?;

    if !provider.authorize(&session).await? {
        tracing::warn!(
            event = "login_denied",
            user = %session.user,
            token_hash = %token_fingerprint(&session.access_token),
            "User does not satisfy GitHub restrictions"
        );
        return Err(ProxyError::Forbidden(format!(
            "user {:?} is not permitted to log in",
            session.user
        )));
    }

    if !state.proxy.validator().is_valid(&session.email) {
        tracing::warn!(
            event = "login_denied",
            user = %session.user,
            email = %session.email,
            "Email domain not allowed"
        );
        return Err(ProxyError::Forbidden(format!(
            "email {:?} is not in an allowed domain",
            session.email
        )));
    }

    let session_cookie = state.proxy.cookies().session_cookie(&session)?;
    let target = redirect_target(Some(&rd), &state.proxy.origin());

    tracing::info!(
        event = "login_complete",
        user = %session.user,
        email = %session.email,
        rd = %target,
        "Authentication successful"
    );

    let mut response = Redirect::to(&target).into_response();
    append_set_cookies(&mut response, &[session_cookie])?;
    Ok(response)
}

/// Sign-out handler - clears the session cookie
pub async fn sign_out_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let target = redirect_target(query.rd.as_deref(), &state.proxy.origin());
    tracing::info!(event = "sign_out", rd = %target, "Session cleared");

    with_cookies(
        Redirect::to(&target).into_response(),
        &[state.proxy.cookies().clear_session_cookie()],
    )
}

/// Auth probe - 202 for a valid session
pub async fn auth_handler(auth: AuthenticatedSession) -> Response {
    with_cookies(StatusCode::ACCEPTED.into_response(), &auth.set_cookies)
}

pub async fn userinfo_handler(auth: AuthenticatedSession) -> Response {
    let info = UserInfo {
        user: auth.session.user,
        email: auth.session.email,
        preferred_username: auth.session.preferred_username,
    };
    with_cookies(Json(info).into_response(), &auth.set_cookies)
}

/// Fallback - unauthenticated requests are sent through sign-in.
///
/// No upstream is configured, so authenticated requests end in `404`.
pub async fn proxy_fallback(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    match state.proxy.authenticate(&headers).await {
        Ok(loaded) => with_cookies(
            (StatusCode::NOT_FOUND, "no upstream configured").into_response(),
            &loaded.set_cookies,
        ),
        Err(ProxyError::Unauthenticated(reason)) => {
            let rd = uri
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            tracing::debug!(rd = %rd, reason = %reason, "Redirecting to sign in");
            let sign_in = build_sign_in_url(&state.proxy.options().proxy_prefix, rd);
            Redirect::to(&sign_in).into_response()
        }
        Err(e) => e.into_response(),
    }
}
