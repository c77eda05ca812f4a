//! Client address and user agent of the current request.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use capa_auth::rate_limit::UNKNOWN_SOURCE_IP;

use crate::state::AppState;

/// Where the request came from.
///
/// The address is the TCP peer unless `trust_proxy_headers` is set, in
/// which case the reverse proxy's `X-Forwarded-For` / `X-Real-IP` wins.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub async fn from_parts(parts: &mut Parts, trust_proxy_headers: bool) -> Self {
        let peer = ConnectInfo::<SocketAddr>::from_request_parts(parts, &())
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr.ip());
        Self {
            ip: client_ip(&parts.headers, peer, trust_proxy_headers),
            user_agent: header_str(&parts.headers, "user-agent").map(str::to_owned),
        }
    }
}

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts, state.config.trust_proxy_headers).await)
    }
}

/// Resolve the source IP used for rate limiting and audit.
///
/// With `trust_proxy_headers`: first non-blank `X-Forwarded-For` entry,
/// else `X-Real-IP`, else the peer. Without it the headers are ignored.
/// `"unknown"` only when there is no peer address at all.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(headers) {
            return ip.to_string();
        }
    }
    peer.map_or_else(|| UNKNOWN_SOURCE_IP.to_string(), |ip| ip.to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            header_str(headers, "x-real-ip")
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
