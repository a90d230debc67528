//! OAuth2 proxy engine
//!
//! Sits in front of the application and authenticates browsers against GitHub.
//!
//! ## Structure
//!
//! - `options`: legacy and normalized configuration
//! - `validation`: option validation run before construction
//! - `session`: session state and its encrypted cookie
//! - `github`: GitHub OAuth2 client, identity and membership lookups
//! - `email`: email domain allow-list
//! - `handlers`: HTTP handlers mounted under the proxy prefix
//! - `extractors`: Axum extractor for an authenticated session
//!
//! ## Authentication Flow
//!
//! 1. Unauthenticated request → redirect to `/oauth2/start?rd=<path>`
//! 2. `/oauth2/start` → CSRF cookie set → redirect to GitHub
//! 3. GitHub → `/oauth2/callback` → code exchange, restrictions checked,
//!    session cookie set → redirect to `rd`
//! 4. `/oauth2/sign_out` clears the session

pub mod email;
pub mod error;
pub mod extractors;
pub mod github;
pub mod handlers;
pub mod helpers;
pub mod options;
pub mod session;
pub mod validation;

pub use email::EmailValidator;
pub use error::ProxyError;
pub use github::GitHubProvider;
pub use options::{LegacyOptions, ProxyOptions};
pub use session::{SessionCookies, SessionState};

use axum::http::HeaderMap;
use chrono::Utc;
use std::sync::Arc;

use helpers::{create_http_client, token_fingerprint};

const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// A session loaded from a request, plus any cookies that must be sent back
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub session: SessionState,
    pub set_cookies: Vec<String>,
}

pub struct OAuthProxy {
    options: ProxyOptions,
    provider: Arc<GitHubProvider>,
    validator: EmailValidator,
    cookies: SessionCookies,
}

impl OAuthProxy {
    pub fn new(options: ProxyOptions, validator: EmailValidator) -> Result<Self, ProxyError> {
        let provider_options = options
            .provider()
            .ok_or_else(|| ProxyError::Config("no provider configured".to_string()))?;

        let http = create_http_client(HTTP_CONNECT_TIMEOUT_SECS, HTTP_REQUEST_TIMEOUT_SECS)
            .map_err(|e| ProxyError::Config(format!("failed to build HTTP client: {}", e)))?;
        let provider = GitHubProvider::new(provider_options, &options.raw_redirect_url, http)?;
        let cookies = SessionCookies::new(&options.cookie);

        tracing::info!(
            provider = %provider_options.id,
            scope = %provider.scope(),
            cookie_name = %options.cookie.name,
            cookie_secure = options.cookie.secure,
            redirect_url = %options.raw_redirect_url,
            github = ?provider_options.github,
            "OAuth2 proxy initialized"
        );

        Ok(OAuthProxy {
            provider: Arc::new(provider),
            options,
            validator,
            cookies,
        })
    }

    pub fn options(&self) -> &ProxyOptions {
        &self.options
    }

    pub fn provider(&self) -> Arc<GitHubProvider> {
        self.provider.clone()
    }

    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    pub fn validator(&self) -> &EmailValidator {
        &self.validator
    }

    /// Origin of the redirect URL; absolute post-login redirects must match it
    pub fn origin(&self) -> String {
        url::Url::parse(&self.options.raw_redirect_url)
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_default()
    }

    /// Decrypt the session cookie without revalidating it
    pub fn load_cookied_session(&self, headers: &HeaderMap) -> Result<SessionState, ProxyError> {
        self.cookies.load(headers)
    }

    /// Load the session and revalidate it with GitHub once it is older than the
    /// refresh interval or past its expiry.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<LoadedSession, ProxyError> {
        let session = self.load_cookied_session(headers)?;

        if !session.needs_refresh(self.options.cookie.refresh, Utc::now()) {
            return Ok(LoadedSession {
                session,
                set_cookies: Vec::new(),
            });
        }

        self.refresh_session(session).await
    }

    /// Revalidate a stale session and re-issue its cookie
    pub async fn refresh_session(&self, mut session: SessionState) -> Result<LoadedSession, ProxyError> {
        if !self.provider.validate_session(&session).await {
            tracing::info!(
                event = "session_invalidated",
                user = %session.user,
                token_hash = %token_fingerprint(&session.access_token),
                "Session no longer valid with GitHub"
            );
            return Err(ProxyError::Unauthenticated(
                "session could not be refreshed".to_string(),
            ));
        }

        session.created_at = Utc::now();
        let cookie = self.cookies.session_cookie(&session)?;
        tracing::debug!(event = "session_refreshed", user = %session.user, "Session refreshed");

        Ok(LoadedSession {
            session,
            set_cookies: vec![cookie],
        })
    }
}
