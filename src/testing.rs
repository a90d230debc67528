//! Test support: an in-process GitHub mock and app state wired to it

use axum::{
    extract::{Form, Path},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::bootstrap;
use crate::config::Options;
use crate::proxy::{EmailValidator, OAuthProxy, SessionState};
use crate::AppState;

pub const LOCAL_URL: &str = "http://127.0.0.1:9999";

/// Known logins; a token is `gho_<login>`
const USERS: [&str; 2] = ["octocat", "outsider"];

fn login_for(headers: &HeaderMap) -> Option<&'static str> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer gho_")?;
    USERS.iter().copied().find(|u| *u == token)
}

async fn access_token(Form(form): Form<HashMap<String, String>>) -> Response {
    match form.get("code").map(String::as_str) {
        Some(code) if USERS.contains(&code) => Json(json!({
            "access_token": format!("gho_{}", code),
            "token_type": "bearer",
            "scope": "user:email"
        }))
        .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "bad_verification_code" })),
        )
            .into_response(),
    }
}

async fn user(headers: HeaderMap) -> Response {
    match login_for(&headers) {
        Some(login) => Json(json!({
            "login": login,
            "avatar_url": format!("https://avatars.example.com/{}.png", login)
        }))
        .into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn user_emails(headers: HeaderMap) -> Response {
    match login_for(&headers) {
        Some("octocat") => Json(json!([
            { "email": "octocat@users.noreply.github.com", "primary": false, "verified": true },
            { "email": "octocat@github.com", "primary": true, "verified": true }
        ]))
        .into_response(),
        Some(_) => Json(json!([
            { "email": "outsider@elsewhere.org", "primary": true, "verified": true }
        ]))
        .into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn user_orgs(headers: HeaderMap) -> Response {
    match login_for(&headers) {
        Some("octocat") => Json(json!([{ "login": "acme" }])).into_response(),
        Some(_) => Json(json!([])).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn user_teams(headers: HeaderMap) -> Response {
    match login_for(&headers) {
        Some("octocat") => Json(json!([
            { "slug": "core", "organization": { "login": "acme" } }
        ]))
        .into_response(),
        Some(_) => Json(json!([])).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn repo(headers: HeaderMap, Path((owner, name)): Path<(String, String)>) -> Response {
    match (login_for(&headers), owner.as_str(), name.as_str()) {
        (Some("octocat"), "acme", "widgets") => Json(json!({
            "private": false,
            "permissions": { "pull": true, "push": true }
        }))
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn collaborator(
    headers: HeaderMap,
    Path((owner, name, login)): Path<(String, String, String)>,
) -> StatusCode {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .map(|v| v == "Bearer ghp_collab")
        .unwrap_or(false);
    if !authorized {
        return StatusCode::UNAUTHORIZED;
    }
    if owner == "acme" && name == "widgets" && login == "octocat" {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Serve the GitHub mock on an ephemeral loopback port and return its base URL
pub async fn spawn_github_mock() -> String {
    let app = Router::new()
        .route("/login/oauth/access_token", post(access_token))
        .route("/user", get(user))
        .route("/user/emails", get(user_emails))
        .route("/user/orgs", get(user_orgs))
        .route("/user/teams", get(user_teams))
        .route("/repos/{owner}/{name}", get(repo))
        .route(
            "/repos/{owner}/{name}/collaborators/{login}",
            get(collaborator),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn options() -> Options {
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

/// App state whose GitHub endpoints point at `github_url`
pub fn app_state(github_url: &str, opts: Options) -> Arc<AppState> {
    let mut proxy_options = bootstrap::proxy_options(&opts).unwrap();
    let provider = &mut proxy_options.providers[0];
    provider.login_url = format!("{}/login/oauth/authorize", github_url);
    provider.redeem_url = format!("{}/login/oauth/access_token", github_url);
    provider.api_url = github_url.to_string();

    let validator = EmailValidator::new(&proxy_options.email_domains);
    let proxy = OAuthProxy::new(proxy_options, validator).unwrap();
    Arc::new(AppState::new(Arc::new(proxy), LOCAL_URL.to_string()))
}

pub fn session_for(login: &str) -> SessionState {
    SessionState {
        access_token: format!("gho_{}", login),
        user: login.to_string(),
        email: format!("{}@github.com", login),
        preferred_username: login.to_string(),
        created_at: Utc::now(),
        expires_on: None,
    }
}

/// `Cookie` request header value carrying an encrypted session
pub fn session_cookie_header(state: &AppState, session: &SessionState) -> String {
    let set_cookie = state.proxy.cookies().session_cookie(session).unwrap();
    cookie_pair(&set_cookie)
}

/// `name=value` part of a `Set-Cookie` value
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}
