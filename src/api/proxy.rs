//! Request logging that optionally trusts reverse-proxy headers.

use axum::{
    extract::{ConnectInfo, Request, State as AxumState},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use tracing::info;

const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";

/// Client address for a request. With `trust_proxy`, the first hop listed in
/// `X-Forwarded-For` wins over the socket peer.
pub fn client_address(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy: bool,
) -> Option<String> {
    let forwarded = trust_proxy
        .then(|| headers.get(FORWARDED_FOR_HEADER))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from);

    forwarded.or_else(|| peer.map(|addr| addr.ip().to_string()))
}

pub async fn log_request(
    AxumState(trust_proxy): AxumState<bool>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_address(request.headers(), peer, trust_proxy);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    info!(
        "{} {} from {} -> {}",
        method,
        path,
        client.as_deref().unwrap_or("unknown"),
        response.status()
    );
    response
}
