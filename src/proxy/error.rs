use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Proxy engine error type
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No usable session on the request.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated with GitHub but not permitted.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// GitHub returned an error or could not be reached.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ProxyError::Forbidden(_) => StatusCode::FORBIDDEN,
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Config(_) | ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ProxyError::Unauthenticated(_) => "UNAUTHENTICATED",
            ProxyError::Forbidden(_) => "FORBIDDEN",
            ProxyError::BadRequest(_) => "BAD_REQUEST",
            ProxyError::Upstream(_) => "UPSTREAM",
            ProxyError::Config(_) | ProxyError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        ProxyError::Upstream(e.to_string())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Proxy request failed");
        } else {
            tracing::debug!(error = %self, "Proxy request rejected");
        }
        (
            status,
            Json(json!({
                "error": status.canonical_reason().unwrap_or("error"),
                "message": self.to_string(),
                "code": self.code(),
            })),
        )
            .into_response()
    }
}
