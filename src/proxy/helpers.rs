//! Pure helper functions for the proxy engine
//!
//! Stateless helpers for URL building, redirect checks, cookie extraction and
//! HTTP client construction.

use axum::http::{header, HeaderMap};
use cookie::Cookie;
use std::time::Duration;

// =============================================================================
// HTTP Client Builders
// =============================================================================

/// Create a reqwest client for OAuth2 and GitHub API requests
pub fn create_http_client(
    connect_timeout_secs: u64,
    request_timeout_secs: u64,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none()) // Security: prevent SSRF
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(request_timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

// =============================================================================
// URL Builders
// =============================================================================

/// Build the sign-in URL that returns the user to `rd` once authenticated
pub fn build_sign_in_url(proxy_prefix: &str, rd: &str) -> String {
    format!("{}/start?rd={}", proxy_prefix, urlencoding::encode(rd))
}

/// Check whether `rd` is safe to redirect to after sign-in or sign-out.
///
/// Relative paths are accepted unless they are protocol-relative (`//host`) or
/// contain a backslash. Absolute URLs must point at the same origin as `server_url`.
pub fn is_safe_redirect(rd: &str, server_url: &str) -> bool {
    if rd.is_empty() || rd.contains('\\') || rd.chars().any(|c| c.is_control()) {
        return false;
    }

    if rd.starts_with('/') {
        return !rd.starts_with("//");
    }

    match (url::Url::parse(rd), url::Url::parse(server_url)) {
        (Ok(target), Ok(server)) => {
            matches!(target.scheme(), "http" | "https")
                && target.origin() == server.origin()
        }
        _ => false,
    }
}

/// Pick the post-login/logout destination, falling back to `/`
pub fn redirect_target(rd: Option<&str>, server_url: &str) -> String {
    match rd {
        Some(rd) if is_safe_redirect(rd, server_url) => rd.to_string(),
        Some(rd) => {
            tracing::warn!(rd = %rd, "Rejected unsafe redirect target");
            "/".to_string()
        }
        None => "/".to_string(),
    }
}

// =============================================================================
// Cookie Extraction
// =============================================================================

/// Value of the named cookie across every `Cookie` header
///
/// Malformed pairs are skipped.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

/// Short, non-reversible token fingerprint for audit logs
pub fn token_fingerprint(token: &str) -> String {
    format!("{:x}", md5::compute(token))
}

// =============================================================================
// Tests
// =============================================================================
