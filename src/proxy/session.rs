//! Session state and its encrypted cookie encoding
//!
//! Cookie values are sealed with the `cookie` crate's private jar (AES-256-GCM).
//! The jar key is derived from the configured cookie secret with SHA-512.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use cookie::{Cookie, CookieJar, Key, SameSite};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::time::Duration;

use super::error::ProxyError;
use super::helpers::extract_cookie;
use super::options::CookieOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub access_token: String,
    pub user: String,
    pub email: String,
    #[serde(default)]
    pub preferred_username: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_on: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_on.map(|exp| exp <= now).unwrap_or(false)
    }

    /// Whether the session must be revalidated with the provider before use
    pub fn needs_refresh(&self, refresh: Duration, now: DateTime<Utc>) -> bool {
        self.is_expired(now) || (!refresh.is_zero() && self.age(now) > refresh)
    }
}

pub struct SessionCookies {
    key: Key,
    options: CookieOptions,
}

impl SessionCookies {
    pub fn new(options: &CookieOptions) -> Self {
        let digest = Sha512::digest(&options.secret);
        SessionCookies {
            key: Key::from(digest.as_slice()),
            options: options.clone(),
        }
    }

    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    /// Load the session from request headers.
    pub fn load(&self, headers: &HeaderMap) -> Result<SessionState, ProxyError> {
        let name = &self.options.name;
        let raw = extract_cookie(headers, name).ok_or_else(|| {
            ProxyError::Unauthenticated(format!("cookie {:?} not present", name))
        })?;
        let value = self.open(name, raw).ok_or_else(|| {
            ProxyError::Unauthenticated("session cookie could not be decrypted".to_string())
        })?;
        serde_json::from_str(&value)
            .map_err(|e| ProxyError::Unauthenticated(format!("invalid session cookie: {}", e)))
    }

    /// `Set-Cookie` value carrying the encrypted session
    pub fn session_cookie(&self, session: &SessionState) -> Result<String, ProxyError> {
        let value = serde_json::to_string(session)
            .map_err(|e| ProxyError::Internal(format!("failed to encode session: {}", e)))?;
        Ok(self.seal(&self.options.name, value, self.options.expire))
    }

    pub fn clear_session_cookie(&self) -> String {
        self.removal(&self.options.name)
    }

    /// `Set-Cookie` value binding an OAuth2 `state` to the post-login redirect
    pub fn csrf_cookie(&self, csrf: &str, rd: &str) -> String {
        self.seal(
            &self.options.csrf_name(),
            format!("{}|{}", csrf, rd),
            self.options.csrf_expire,
        )
    }

    /// Returns `(csrf, rd)` from the CSRF cookie
    pub fn load_csrf(&self, headers: &HeaderMap) -> Option<(String, String)> {
        let name = self.options.csrf_name();
        let raw = extract_cookie(headers, &name)?;
        let value = self.open(&name, raw)?;
        value
            .split_once('|')
            .map(|(csrf, rd)| (csrf.to_string(), rd.to_string()))
    }

    pub fn clear_csrf_cookie(&self) -> String {
        self.removal(&self.options.csrf_name())
    }

    fn build(&self, name: &str, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name.to_string(), value))
            .path(self.options.path.clone())
            .http_only(self.options.http_only)
            .secure(self.options.secure)
            .same_site(SameSite::Lax)
            .max_age(cookie::time::Duration::seconds(max_age.as_secs() as i64))
            .build()
    }

    fn seal(&self, name: &str, value: String, max_age: Duration) -> String {
        let mut jar = CookieJar::new();
        jar.private_mut(&self.key)
            .add(self.build(name, value, max_age));
        jar.get(name).map(|c| c.to_string()).unwrap_or_default()
    }

    fn open(&self, name: &str, raw: String) -> Option<String> {
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(name.to_string(), raw));
        jar.private(&self.key)
            .get(name)
            .map(|c| c.value().to_string())
    }

    fn removal(&self, name: &str) -> String {
        self.build(name, String::new(), Duration::ZERO).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::options::{DEFAULT_COOKIE_EXPIRE, DEFAULT_CSRF_EXPIRE};
    use axum::http::HeaderValue;

    fn cookie_options(secret: &[u8]) -> CookieOptions {
        CookieOptions {
            name: "obot_access_token".to_string(),
            secret: secret.to_vec(),
            expire: DEFAULT_COOKIE_EXPIRE,
            refresh: Duration::from_secs(3600),
            csrf_expire: DEFAULT_CSRF_EXPIRE,
            secure: true,
            http_only: true,
            path: "/".to_string(),
        }
    }

    fn session() -> SessionState {
        SessionState {
            access_token: "gho_token".to_string(),
            user: "octocat".to_string(),
            email: "octocat@github.com".to_string(),
            preferred_username: "octocat".to_string(),
            created_at: Utc::now(),
            expires_on: None,
        }
    }

    /// Turn a `Set-Cookie` value into the request `Cookie` header a browser would send
    fn request_headers(set_cookie: &str) -> HeaderMap {
        let pair = set_cookie.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_str(pair).unwrap());
        headers
    }

    #[test]
    fn test_session_cookie_is_encrypted() {
        let cookies = SessionCookies::new(&cookie_options(b"0123456789abcdef"));
        let set_cookie = cookies.session_cookie(&session()).unwrap();

        assert!(set_cookie.starts_with("obot_access_token="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Secure"));
        assert!(!set_cookie.contains("gho_token"));
        assert!(!set_cookie.contains("octocat"));

        let loaded = cookies.load(&request_headers(&set_cookie)).unwrap();
        assert_eq!(loaded, session());
    }

    #[test]
    fn test_insecure_cookie_flag() {
        let mut options = cookie_options(b"0123456789abcdef");
        options.secure = false;
        let cookies = SessionCookies::new(&options);
        let set_cookie = cookies.session_cookie(&session()).unwrap();
        assert!(!set_cookie.contains("Secure"));
    }

    #[test]
    fn test_wrong_secret_cannot_decrypt() {
        let sealer = SessionCookies::new(&cookie_options(b"0123456789abcdef"));
        let other = SessionCookies::new(&cookie_options(b"fedcba9876543210"));
        let set_cookie = sealer.session_cookie(&session()).unwrap();

        let err = other.load(&request_headers(&set_cookie)).unwrap_err();
        assert!(matches!(err, ProxyError::Unauthenticated(_)));
    }

    #[test]
    fn test_missing_cookie() {
        let cookies = SessionCookies::new(&cookie_options(b"0123456789abcdef"));
        let err = cookies.load(&HeaderMap::new()).unwrap_err();
        assert!(err.to_string().contains("not present"));
    }

    #[test]
    fn test_csrf_cookie_keeps_redirect() {
        let cookies = SessionCookies::new(&cookie_options(b"0123456789abcdef"));
        let set_cookie = cookies.csrf_cookie("state123", "/chat?a=1|2");
        assert!(set_cookie.starts_with("obot_access_token_csrf="));

        let (csrf, rd) = cookies.load_csrf(&request_headers(&set_cookie)).unwrap();
        assert_eq!(csrf, "state123");
        assert_eq!(rd, "/chat?a=1|2");
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookies = SessionCookies::new(&cookie_options(b"0123456789abcdef"));
        let cleared = cookies.clear_session_cookie();
        assert!(cleared.starts_with("obot_access_token=;"));
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn test_needs_refresh() {
        let now = Utc::now();
        let mut s = session();
        s.created_at = now - chrono::Duration::minutes(30);
        assert!(!s.needs_refresh(Duration::from_secs(3600), now));

        s.created_at = now - chrono::Duration::minutes(90);
        assert!(s.needs_refresh(Duration::from_secs(3600), now));
        assert!(!s.needs_refresh(Duration::ZERO, now));

        s.created_at = now;
        s.expires_on = Some(now - chrono::Duration::seconds(1));
        assert!(s.is_expired(now));
        assert!(s.needs_refresh(Duration::ZERO, now));
    }
}
