use std::env;

pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_EMAIL_DOMAINS: &str = "*";

/// Auth provider options sourced from the environment
#[derive(Clone)]
pub struct Options {
    pub client_id: String,
    pub client_secret: String,
    pub server_url: String,
    /// Base64-encoded secret used to encrypt cookies
    pub cookie_secret: String,
    /// Comma-separated email domains allowed for authentication
    pub email_domains: String,

    // GitHub restrictions
    /// Restrict logins to members of any of these teams (comma-separated list)
    pub github_teams: Option<String>,
    /// Restrict logins to members of this organization
    pub github_org: Option<String>,
    /// Restrict logins to collaborators on this repository (`orgname/repo`)
    pub github_repo: Option<String>,
    /// Token used when verifying repository collaborators (needs push access)
    pub github_token: Option<String>,
    /// Users allowed to log in even without org/team/repo membership
    pub github_allow_users: Option<String>,
}

impl Options {
    /// Load options from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load options through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        Ok(Options {
            client_id: required("OBOT_GITHUB_AUTH_PROVIDER_CLIENT_ID")?,
            client_secret: required("OBOT_GITHUB_AUTH_PROVIDER_CLIENT_SECRET")?,
            server_url: required("OBOT_SERVER_URL")?,
            cookie_secret: required("OBOT_AUTH_PROVIDER_COOKIE_SECRET")?,
            email_domains: get("OBOT_AUTH_PROVIDER_EMAIL_DOMAINS")
                .unwrap_or_else(|| DEFAULT_EMAIL_DOMAINS.to_string()),
            github_teams: get("OBOT_GITHUB_AUTH_PROVIDER_TEAMS"),
            github_org: get("OBOT_GITHUB_AUTH_PROVIDER_ORG"),
            github_repo: get("OBOT_GITHUB_AUTH_PROVIDER_REPO"),
            github_token: get("OBOT_GITHUB_AUTH_PROVIDER_TOKEN"),
            github_allow_users: get("OBOT_GITHUB_AUTH_PROVIDER_ALLOW_USERS"),
        })
    }

    /// Whether cookies must carry the Secure attribute
    pub fn uses_https(&self) -> bool {
        self.server_url.starts_with("https://")
    }

    /// OAuth2 callback URL registered with GitHub
    pub fn redirect_url(&self) -> String {
        format!("{}/oauth2/callback", self.server_url)
    }
}

/// Loopback listener configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT").filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("invalid PORT {:?}: {}", raw, e))?,
            None => DEFAULT_PORT,
        };
        Ok(ServerConfig { port })
    }

    /// Get bind address for server
    pub fn bind_address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Base URL reported by the root endpoint
    pub fn local_url(&self) -> String {
        format!("http://{}", self.bind_address())
    }
}
