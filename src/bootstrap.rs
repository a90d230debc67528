//! Translation of environment options into proxy engine options

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::time::Duration;

use crate::config::Options;
use crate::proxy::options::{split_list, LegacyOptions, ProxyOptions, PROVIDER_GITHUB};

pub const COOKIE_NAME: &str = "obot_access_token";
pub const COOKIE_REFRESH: Duration = Duration::from_secs(60 * 60);

/// Decode the base64 cookie secret
pub fn decode_cookie_secret(secret: &str) -> anyhow::Result<Vec<u8>> {
    STANDARD
        .decode(secret)
        .context("failed to decode cookie secret")
}

/// Fill the engine's legacy (provider-specific) options from `opts`
pub fn legacy_options(opts: &Options) -> LegacyOptions {
    let mut legacy = LegacyOptions::new();
    let provider = &mut legacy.legacy_provider;
    provider.provider_type = PROVIDER_GITHUB.to_string();
    provider.provider_name = PROVIDER_GITHUB.to_string();
    provider.client_id = opts.client_id.clone();
    provider.client_secret = opts.client_secret.clone();

    // GitHub-specific options
    if let Some(teams) = &opts.github_teams {
        provider.github_team = teams.clone();
    }
    if let Some(org) = &opts.github_org {
        provider.github_org = org.clone();
    }
    if let Some(repo) = &opts.github_repo {
        provider.github_repo = repo.clone();
    }
    if let Some(token) = &opts.github_token {
        provider.github_token = token.clone();
    }
    if let Some(users) = &opts.github_allow_users {
        provider.github_users = users.split(',').map(str::to_string).collect();
    }

    legacy
}

/// Build validated-ready proxy options: decode the secret, convert the legacy
/// options, then apply the cookie/redirect/email overrides.
pub fn proxy_options(opts: &Options) -> anyhow::Result<ProxyOptions> {
    let cookie_secret = decode_cookie_secret(&opts.cookie_secret)?;

    let mut proxy_opts = legacy_options(opts)
        .to_options()
        .context("failed to convert legacy options to new options")?;

    proxy_opts.cookie.refresh = COOKIE_REFRESH;
    proxy_opts.cookie.name = COOKIE_NAME.to_string();
    proxy_opts.cookie.secret = cookie_secret;
    proxy_opts.cookie.secure = opts.uses_https();
    proxy_opts.raw_redirect_url = opts.redirect_url();
    if !opts.email_domains.is_empty() {
        proxy_opts.email_domains = split_list(&opts.email_domains);
    }

    Ok(proxy_opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::validation::validate;

    fn options() -> Options {
        Options {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            server_url: "https://obot.example.com".to_string(),
            cookie_secret: "MDEyMzQ1Njc4OWFiY2RlZg==".to_string(),
            email_domains: "*".to_string(),
            github_teams: None,
            github_org: None,
            github_repo: None,
            github_token: None,
            github_allow_users: None,
        }
    }

    #[test]
    fn test_cookie_secret_decoding() {
        assert_eq!(
            decode_cookie_secret("MDEyMzQ1Njc4OWFiY2RlZg==").unwrap(),
            b"0123456789abcdef"
        );
        assert!(decode_cookie_secret("not base64!").is_err());
        assert!(decode_cookie_secret("MDEyMzQ1Njc4OWFiY2RlZg").is_err());
    }

    #[test]
    fn test_invalid_secret_fails_translation() {
        let mut opts = options();
        opts.cookie_secret = "%%%".to_string();
        let err = proxy_options(&opts).unwrap_err();
        assert!(err.to_string().contains("failed to decode cookie secret"));
    }

    #[test]
    fn test_cookie_overrides() {
        let proxy_opts = proxy_options(&options()).unwrap();
        assert_eq!(proxy_opts.cookie.name, "obot_access_token");
        assert_eq!(proxy_opts.cookie.refresh, Duration::from_secs(3600));
        assert_eq!(proxy_opts.cookie.secret, b"0123456789abcdef");
        assert!(validate(&proxy_opts).is_ok());
    }

    #[test]
    fn test_redirect_url_is_server_callback() {
        for server in ["https://obot.example.com", "http://localhost:8080", "https://x.io/sub"] {
            let mut opts = options();
            opts.server_url = server.to_string();
            let proxy_opts = proxy_options(&opts).unwrap();
            assert_eq!(proxy_opts.raw_redirect_url, format!("{}/oauth2/callback", server));
        }
    }

    #[test]
    fn test_secure_flag_follows_scheme() {
        let mut opts = options();
        assert!(proxy_options(&opts).unwrap().cookie.secure);

        opts.server_url = "http://localhost:8080".to_string();
        assert!(!proxy_options(&opts).unwrap().cookie.secure);

        opts.server_url = "HTTPS://obot.example.com".to_string();
        assert!(!proxy_options(&opts).unwrap().cookie.secure);
    }

    #[test]
    fn test_email_domains() {
        let mut opts = options();
        opts.email_domains = "a.com,b.com".to_string();
        assert_eq!(
            proxy_options(&opts).unwrap().email_domains,
            vec!["a.com".to_string(), "b.com".to_string()]
        );

        opts.email_domains = String::new();
        let proxy_opts = proxy_options(&opts).unwrap();
        assert!(proxy_opts.email_domains.is_empty());
        assert!(validate(&proxy_opts).is_err());
    }

    #[test]
    fn test_github_restrictions_translate() {
        let mut opts = options();
        opts.github_org = Some("acme".to_string());
        opts.github_teams = Some("core,ops".to_string());
        opts.github_repo = Some("acme/widgets".to_string());
        opts.github_token = Some("ghp_collab".to_string());
        opts.github_allow_users = Some("octocat,hubot".to_string());

        let legacy = legacy_options(&opts);
        assert_eq!(legacy.legacy_provider.provider_type, "github");
        assert_eq!(legacy.legacy_provider.github_team, "core,ops");
        assert_eq!(legacy.legacy_provider.github_users, vec!["octocat", "hubot"]);

        let proxy_opts = proxy_options(&opts).unwrap();
        let github = &proxy_opts.provider().unwrap().github;
        assert_eq!(github.org.as_deref(), Some("acme"));
        assert_eq!(github.teams, vec!["core", "ops"]);
        assert_eq!(github.repo.as_deref(), Some("acme/widgets"));
        assert_eq!(github.token.as_deref(), Some("ghp_collab"));
        assert_eq!(github.users, vec!["octocat", "hubot"]);
    }
}
