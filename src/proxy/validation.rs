//! Validation of normalized proxy options
//!
//! Every problem is collected so a misconfigured deployment reports all of them at once.

use thiserror::Error;

use super::options::ProxyOptions;

#[derive(Debug, Error)]
#[error("invalid configuration:\n  {}", .messages.join("\n  "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

pub fn validate(opts: &ProxyOptions) -> Result<(), ValidationError> {
    let mut messages = Vec::new();

    match opts.providers.len() {
        0 => messages.push("at least one provider must be configured".to_string()),
        1 => {}
        n => messages.push(format!("only one provider is supported, found {}", n)),
    }

    if let Some(provider) = opts.provider() {
        if provider.client_id.is_empty() {
            messages.push("missing setting: client-id".to_string());
        }
        if provider.client_secret.is_empty() {
            messages.push("missing setting: client-secret".to_string());
        }
        for (name, raw) in [
            ("login-url", &provider.login_url),
            ("redeem-url", &provider.redeem_url),
            ("api-url", &provider.api_url),
        ] {
            if let Err(e) = url::Url::parse(raw) {
                messages.push(format!("error parsing {}={:?}: {}", name, raw, e));
            }
        }

        let github = &provider.github;
        if github.org.is_none() {
            for team in &github.teams {
                let qualified = team
                    .split_once(':')
                    .map(|(org, slug)| !org.is_empty() && !slug.is_empty())
                    .unwrap_or(false);
                if !qualified {
                    messages.push(format!(
                        "github team {:?} must be formatted orgname:team when no github org is set",
                        team
                    ));
                }
            }
        }
        if let Some(repo) = &github.repo {
            let valid = repo
                .split_once('/')
                .map(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
                .unwrap_or(false);
            if !valid {
                messages.push(format!(
                    "github repo must be formatted orgname/repo, got {:?}",
                    repo
                ));
            }
        }
    }

    let secret_len = opts.cookie.secret.len();
    if !matches!(secret_len, 16 | 24 | 32) {
        messages.push(format!(
            "cookie_secret must be 16, 24, or 32 bytes to create an AES cipher, but is {} bytes",
            secret_len
        ));
    }

    if !opts.cookie.refresh.is_zero() && opts.cookie.refresh >= opts.cookie.expire {
        messages.push(format!(
            "cookie_refresh ({:?}) must be less than cookie_expire ({:?})",
            opts.cookie.refresh, opts.cookie.expire
        ));
    }

    if opts.cookie.name.is_empty() {
        messages.push("missing setting: cookie-name".to_string());
    }

    if opts.email_domains.is_empty() {
        messages.push(
            "missing setting for email validation: email-domain required; \
             use email-domain=* to authorize all email addresses"
                .to_string(),
        );
    }

    match url::Url::parse(&opts.raw_redirect_url) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => {}
        Ok(u) => messages.push(format!(
            "redirect-url must use http or https, got {:?}",
            u.scheme()
        )),
        Err(e) => messages.push(format!(
            "error parsing redirect-url={:?}: {}",
            opts.raw_redirect_url, e
        )),
    }

    if !opts.proxy_prefix.starts_with('/') || opts.proxy_prefix.ends_with('/') {
        messages.push(format!(
            "proxy-prefix must start with '/' and not end with '/', got {:?}",
            opts.proxy_prefix
        ));
    }

    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { messages })
    }
}
