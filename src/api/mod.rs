//! HTTP surface: health check and webhook ingestion on `/`

pub mod proxy;
pub mod webhook;

use axum::{Router, middleware, routing};

use crate::SharedState;

pub use webhook::{handle_webhook, root};

pub fn router(state: SharedState) -> Router {
    let trust_proxy = state.settings.use_proxy_fix;
    Router::new()
        .route("/", routing::get(root).post(handle_webhook))
        .with_state(state)
        .layer(middleware::from_fn_with_state(trust_proxy, proxy::log_request))
}
