//! GitHub identity provider
//!
//! OAuth2 code exchange goes through the `oauth2` crate. Identity and membership
//! lookups are thin typed calls against the GitHub REST API.

use chrono::Utc;
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use reqwest::StatusCode;
use serde::Deserialize;

use super::error::ProxyError;
use super::options::{GitHubOptions, ProviderOptions};
use super::session::SessionState;

const DEFAULT_SCOPE: &str = "user:email";
const ORG_SCOPE: &str = "read:org";
const PER_PAGE: usize = 100;

/// OAuth client with auth and token endpoints set
type GitHubOAuthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Debug, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct GitHubOrg {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubTeam {
    slug: String,
    organization: GitHubOrg,
}

#[derive(Debug, Default, Deserialize)]
struct RepoPermissions {
    #[serde(default)]
    pull: bool,
    #[serde(default)]
    push: bool,
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    #[serde(default)]
    private: bool,
    #[serde(default)]
    permissions: RepoPermissions,
}

pub struct GitHubProvider {
    oauth: GitHubOAuthClient,
    http: reqwest::Client,
    api_url: String,
    scope: String,
    restrictions: GitHubOptions,
}

impl GitHubProvider {
    pub fn new(
        options: &ProviderOptions,
        redirect_url: &str,
        http: reqwest::Client,
    ) -> Result<Self, ProxyError> {
        let auth_url = AuthUrl::new(options.login_url.clone())
            .map_err(|e| ProxyError::Config(format!("Invalid login URL: {}", e)))?;
        let token_url = TokenUrl::new(options.redeem_url.clone())
            .map_err(|e| ProxyError::Config(format!("Invalid redeem URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(redirect_url.to_string())
            .map_err(|e| ProxyError::Config(format!("Invalid redirect URL: {}", e)))?;

        let oauth = BasicClient::new(ClientId::new(options.client_id.clone()))
            .set_client_secret(ClientSecret::new(options.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let restrictions = options.github.clone();
        let scope = options.scope.clone().unwrap_or_else(|| {
            if restrictions.org.is_some() || !restrictions.teams.is_empty() {
                format!("{} {}", DEFAULT_SCOPE, ORG_SCOPE)
            } else {
                DEFAULT_SCOPE.to_string()
            }
        });

        Ok(GitHubProvider {
            oauth,
            http,
            api_url: options.api_url.trim_end_matches('/').to_string(),
            scope,
            restrictions,
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Authorization URL and the CSRF token bound to it
    pub fn authorize_url(&self) -> (url::Url, CsrfToken) {
        self.oauth
            .authorize_url(CsrfToken::new_random)
            .add_scopes(
                self.scope
                    .split_whitespace()
                    .map(|s| Scope::new(s.to_string())),
            )
            .url()
    }

    /// Exchange an authorization code for a session carrying only the token
    pub async fn redeem(&self, code: String) -> Result<SessionState, ProxyError> {
        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&self.http)
            .await
            .map_err(|e| ProxyError::Upstream(format!("token exchange failed: {}", e)))?;

        let now = Utc::now();
        let expires_on = token
            .expires_in()
            .and_then(|d| chrono::Duration::from_std(d).ok())
            .map(|d| now + d);

        Ok(SessionState {
            access_token: token.access_token().secret().clone(),
            user: String::new(),
            email: String::new(),
            preferred_username: String::new(),
            created_at: now,
            expires_on,
        })
    }

    /// Fill in user and email on a freshly redeemed session
    pub async fn enrich_session(&self, session: &mut SessionState) -> Result<(), ProxyError> {
        let user = self.fetch_user(&session.access_token).await?;
        let email = match self.primary_email(&session.access_token).await? {
            Some(email) => email,
            None => user.email.clone().unwrap_or_default(),
        };

        session.user = user.login.clone();
        session.preferred_username = user.login;
        session.email = email;
        Ok(())
    }

    /// Apply allow-users / org / team / repo restrictions to an enriched session.
    ///
    /// Listed users bypass org, team and repo checks. When only an allow-list is
    /// configured, everyone else is rejected. Without an org, team entries are
    /// org-qualified (`org:slug`).
    pub async fn authorize(&self, session: &SessionState) -> Result<bool, ProxyError> {
        let r = &self.restrictions;
        let token = &session.access_token;

        if !r.users.is_empty() {
            if r.users.iter().any(|u| u.eq_ignore_ascii_case(&session.user)) {
                return Ok(true);
            }
            if r.org.is_none() && r.teams.is_empty() && r.repo.is_none() {
                return Ok(false);
            }
        }

        if let Some(org) = &r.org {
            if r.teams.is_empty() {
                return self.has_org(token, org).await;
            }
            return self.has_org_team(token, org, &r.teams).await;
        }

        if !r.teams.is_empty() {
            return self.has_qualified_team(token, &r.teams).await;
        }

        if let Some(repo) = &r.repo {
            return match &r.token {
                Some(collaborator_token) => {
                    self.is_collaborator(collaborator_token, repo, &session.user)
                        .await
                }
                None => self.has_repo(token, repo).await,
            };
        }

        Ok(true)
    }

    /// Check the access token is still accepted by GitHub
    pub async fn validate_session(&self, session: &SessionState) -> bool {
        match self.get(&session.access_token, "/user").send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "Session validation request failed");
                false
            }
        }
    }

    pub async fn fetch_user(&self, token: &str) -> Result<GitHubUser, ProxyError> {
        let resp = self.get(token, "/user").send().await?;
        if !resp.status().is_success() {
            return Err(ProxyError::Upstream(format!(
                "got {} from GitHub /user",
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }

    /// Profile avatar for the token's user
    pub async fn fetch_avatar_url(&self, token: &str) -> Result<String, ProxyError> {
        let user = self.fetch_user(token).await?;
        user.avatar_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ProxyError::Upstream("GitHub profile has no avatar_url".to_string()))
    }

    async fn primary_email(&self, token: &str) -> Result<Option<String>, ProxyError> {
        let resp = self.get(token, "/user/emails").send().await?;
        if !resp.status().is_success() {
            return Err(ProxyError::Upstream(format!(
                "got {} from GitHub /user/emails",
                resp.status()
            )));
        }
        let emails: Vec<GitHubEmail> = resp.json().await?;
        Ok(emails
            .into_iter()
            .find(|e| e.primary && e.verified)
            .map(|e| e.email))
    }

    async fn has_org(&self, token: &str, org: &str) -> Result<bool, ProxyError> {
        let orgs: Vec<GitHubOrg> = self.get_all(token, "/user/orgs").await?;
        let member = orgs.iter().any(|o| o.login.eq_ignore_ascii_case(org));
        tracing::debug!(org = %org, member, orgs_seen = orgs.len(), "Checked org membership");
        Ok(member)
    }

    async fn has_org_team(
        &self,
        token: &str,
        org: &str,
        teams: &[String],
    ) -> Result<bool, ProxyError> {
        let user_teams: Vec<GitHubTeam> = self.get_all(token, "/user/teams").await?;
        let member = user_teams.iter().any(|t| {
            t.organization.login.eq_ignore_ascii_case(org)
                && teams.iter().any(|want| want.eq_ignore_ascii_case(&t.slug))
        });
        tracing::debug!(org = %org, teams = ?teams, member, "Checked team membership");
        Ok(member)
    }

    /// Membership in any `org:slug` team; unqualified entries never match
    async fn has_qualified_team(&self, token: &str, teams: &[String]) -> Result<bool, ProxyError> {
        let wanted: Vec<(&str, &str)> = teams.iter().filter_map(|t| t.split_once(':')).collect();
        let user_teams: Vec<GitHubTeam> = self.get_all(token, "/user/teams").await?;
        let member = user_teams.iter().any(|t| {
            wanted.iter().any(|(org, slug)| {
                t.organization.login.eq_ignore_ascii_case(org) && t.slug.eq_ignore_ascii_case(slug)
            })
        });
        tracing::debug!(teams = ?teams, member, "Checked qualified team membership");
        Ok(member)
    }

    async fn has_repo(&self, token: &str, repo: &str) -> Result<bool, ProxyError> {
        let resp = self.get(token, &format!("/repos/{}", repo)).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Ok(false),
            s if s.is_success() => {
                let repo: GitHubRepo = resp.json().await?;
                Ok(repo.permissions.push || (repo.private && repo.permissions.pull))
            }
            s => Err(ProxyError::Upstream(format!("got {} from GitHub /repos", s))),
        }
    }

    async fn is_collaborator(
        &self,
        token: &str,
        repo: &str,
        login: &str,
    ) -> Result<bool, ProxyError> {
        let path = format!("/repos/{}/collaborators/{}", repo, login);
        let resp = self.get(token, &path).send().await?;
        match resp.status() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(ProxyError::Upstream(format!(
                "got {} from GitHub collaborators check",
                s
            ))),
        }
    }

    async fn get_all<T>(&self, token: &str, path: &str) -> Result<Vec<T>, ProxyError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 1usize;
        loop {
            let resp = self
                .get(token, path)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(ProxyError::Upstream(format!(
                    "got {} from GitHub {}",
                    resp.status(),
                    path
                )));
            }
            let batch: Vec<T> = resp.json().await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                return Ok(items);
            }
            page += 1;
        }
    }

    fn get(&self, token: &str, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.api_url, path))
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(token)
    }
}
