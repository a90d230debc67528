//! Proxy engine options
//!
//! `LegacyOptions` is the flat, provider-specific format that embedding code fills in.
//! `LegacyOptions::to_options` converts it into the normalized `ProxyOptions` the
//! engine runs on.

use std::time::Duration;

use super::error::ProxyError;

pub const PROVIDER_GITHUB: &str = "github";
pub const DEFAULT_PROXY_PREFIX: &str = "/oauth2";
pub const DEFAULT_COOKIE_NAME: &str = "_oauth2_proxy";
pub const DEFAULT_COOKIE_EXPIRE: Duration = Duration::from_secs(168 * 60 * 60);
pub const DEFAULT_CSRF_EXPIRE: Duration = Duration::from_secs(15 * 60);

pub const GITHUB_LOGIN_URL: &str = "https://github.com/login/oauth/authorize";
pub const GITHUB_REDEEM_URL: &str = "https://github.com/login/oauth/access_token";
pub const GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Default)]
pub struct LegacyProvider {
    pub provider_type: String,
    pub provider_name: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,

    /// Comma-separated team slugs
    pub github_team: String,
    pub github_org: String,
    /// `owner/name`
    pub github_repo: String,
    pub github_token: String,
    pub github_users: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LegacyOptions {
    pub legacy_provider: LegacyProvider,
    pub proxy_prefix: String,
    pub cookie_name: String,
    pub cookie_expire: Duration,
    pub cookie_refresh: Duration,
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
}

impl Default for LegacyOptions {
    fn default() -> Self {
        LegacyOptions {
            legacy_provider: LegacyProvider::default(),
            proxy_prefix: DEFAULT_PROXY_PREFIX.to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_expire: DEFAULT_COOKIE_EXPIRE,
            cookie_refresh: Duration::ZERO,
            cookie_secure: true,
            cookie_http_only: true,
        }
    }
}

impl LegacyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert into normalized proxy options
    pub fn to_options(&self) -> Result<ProxyOptions, ProxyError> {
        let provider = self.legacy_provider.to_provider_options()?;

        Ok(ProxyOptions {
            proxy_prefix: self.proxy_prefix.clone(),
            raw_redirect_url: String::new(),
            email_domains: Vec::new(),
            cookie: CookieOptions {
                name: self.cookie_name.clone(),
                secret: Vec::new(),
                expire: self.cookie_expire,
                refresh: self.cookie_refresh,
                csrf_expire: DEFAULT_CSRF_EXPIRE,
                secure: self.cookie_secure,
                http_only: self.cookie_http_only,
                path: "/".to_string(),
            },
            providers: vec![provider],
        })
    }
}

impl LegacyProvider {
    fn to_provider_options(&self) -> Result<ProviderOptions, ProxyError> {
        if self.provider_type != PROVIDER_GITHUB {
            return Err(ProxyError::Config(format!(
                "unknown provider type: {:?}",
                self.provider_type
            )));
        }

        let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

        Ok(ProviderOptions {
            id: format!("{}={}", self.provider_type, self.client_id),
            name: self.provider_name.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scope: self.scope.clone(),
            login_url: GITHUB_LOGIN_URL.to_string(),
            redeem_url: GITHUB_REDEEM_URL.to_string(),
            api_url: GITHUB_API_URL.to_string(),
            github: GitHubOptions {
                org: non_empty(&self.github_org),
                teams: split_list(&self.github_team),
                repo: non_empty(&self.github_repo),
                token: non_empty(&self.github_token),
                users: self
                    .github_users
                    .iter()
                    .map(|u| u.trim().to_string())
                    .filter(|u| !u.is_empty())
                    .collect(),
            },
        })
    }
}

/// Split a comma-separated list, dropping empty entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone)]
pub struct ProxyOptions {
    pub proxy_prefix: String,
    pub raw_redirect_url: String,
    pub email_domains: Vec<String>,
    pub cookie: CookieOptions,
    pub providers: Vec<ProviderOptions>,
}

impl ProxyOptions {
    pub fn provider(&self) -> Option<&ProviderOptions> {
        self.providers.first()
    }
}

#[derive(Clone)]
pub struct CookieOptions {
    pub name: String,
    pub secret: Vec<u8>,
    pub expire: Duration,
    /// Sessions older than this are revalidated with the provider (zero disables)
    pub refresh: Duration,
    pub csrf_expire: Duration,
    pub secure: bool,
    pub http_only: bool,
    pub path: String,
}

impl CookieOptions {
    pub fn csrf_name(&self) -> String {
        format!("{}_csrf", self.name)
    }
}

impl std::fmt::Debug for CookieOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieOptions")
            .field("name", &self.name)
            .field("secret_len", &self.secret.len())
            .field("expire", &self.expire)
            .field("refresh", &self.refresh)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("path", &self.path)
            .finish()
    }
}

#[derive(Clone)]
pub struct ProviderOptions {
    pub id: String,
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
    pub login_url: String,
    pub redeem_url: String,
    /// GitHub REST API base
    pub api_url: String,
    pub github: GitHubOptions,
}

impl std::fmt::Debug for ProviderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderOptions")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .field("login_url", &self.login_url)
            .field("redeem_url", &self.redeem_url)
            .field("api_url", &self.api_url)
            .field("github", &self.github)
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct GitHubOptions {
    pub org: Option<String>,
    pub teams: Vec<String>,
    pub repo: Option<String>,
    pub token: Option<String>,
    pub users: Vec<String>,
}

impl std::fmt::Debug for GitHubOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubOptions")
            .field("org", &self.org)
            .field("teams", &self.teams)
            .field("repo", &self.repo)
            .field("has_token", &self.token.is_some())
            .field("users", &self.users)
            .finish()
    }
}
