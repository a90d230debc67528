use super::handlers::root_handler;
use super::icon::obot_get_icon_url;
use super::state::obot_get_state;
use crate::{proxy, AppState};
use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn create_router(state: Arc<AppState>) -> Router {
    let proxy_prefix = state.proxy.options().proxy_prefix.clone();

    Router::new()
        .route("/", any(root_handler))
        .route("/obot-get-state", get(obot_get_state).post(obot_get_state))
        .route("/obot-get-icon-url", get(obot_get_icon_url))
        .merge(proxy::handlers::routes(&proxy_prefix))
        // Everything else belongs to the proxy engine
        .fallback(proxy::handlers::proxy_fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
