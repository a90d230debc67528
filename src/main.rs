use anyhow::{Context, Result};
use github_auth_provider::{
    bootstrap,
    config::{Options, ServerConfig},
    proxy::{validation, EmailValidator, OAuthProxy},
    web, AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = Options::from_env().context("failed to load options")?;
    let server = ServerConfig::from_env().context("failed to load options")?;

    let proxy_options = bootstrap::proxy_options(&options)?;
    validation::validate(&proxy_options).context("failed to validate options")?;

    let validator = EmailValidator::new(&proxy_options.email_domains);
    let proxy = OAuthProxy::new(proxy_options, validator).context("failed to create oauth2 proxy")?;

    let state = Arc::new(AppState::new(Arc::new(proxy), server.local_url()));
    let app = web::create_router(state);

    // Bind and serve
    let bind_address = server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to listen on {}", bind_address))?;
    tracing::info!("listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("failed to listen and serve")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown signal handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
