//! GitHub auth provider library
//!
//! Translates environment configuration into an OAuth2 proxy engine backed by GitHub
//! and serves it next to a few provider endpoints. The `workspace` module backs the
//! separate `workspace-files` tool binary.

#![deny(dead_code)]

pub mod bootstrap;
pub mod config;
pub mod proxy;
pub mod web;
pub mod workspace;

#[cfg(test)]
mod testing;

use proxy::OAuthProxy;
use std::sync::Arc;
use web::IconUrlFetcher;

pub struct AppState {
    pub proxy: Arc<OAuthProxy>,
    pub icon_fetcher: Arc<dyn IconUrlFetcher>,
    /// `http://127.0.0.1:<port>`, returned by the root endpoint
    pub local_url: String,
}

impl AppState {
    /// State whose icon lookups go to the proxy's GitHub provider
    pub fn new(proxy: Arc<OAuthProxy>, local_url: String) -> Self {
        let icon_fetcher: Arc<dyn IconUrlFetcher> = proxy.provider();
        AppState {
            proxy,
            icon_fetcher,
            local_url,
        }
    }
}
