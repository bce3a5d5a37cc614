//! Request context: request IDs and the caller's masked address.
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The client address is masked once, at ingress; only the masked form
//!   is stored on the request and written to logs
//! - Limiter and abuse bookkeeping key on the socket peer, never on headers

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, Extensions, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::security::mask::mask_ip;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Masked address of the caller, attached by [`resolve_client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

impl ClientAddr {
    /// Resolve and mask the caller's address.
    ///
    /// Prefers the first `X-Forwarded-For` hop when `trust_forwarded` is set,
    /// then the socket peer, then `unknown`.
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> Self {
        let forwarded = trust_forwarded
            .then(|| headers.get(X_FORWARDED_FOR))
            .flatten()
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let raw = forwarded
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| "unknown".to_string());

        ClientAddr(mask_ip(&raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(client) = parts.extensions.get::<ClientAddr>() {
            return Ok(client.clone());
        }
        let peer = peer_addr(&parts.extensions);
        Ok(ClientAddr::resolve(&parts.headers, peer, false))
    }
}

/// Socket address of the connection, when the server recorded one.
pub fn peer_addr(extensions: &Extensions) -> Option<SocketAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Key for per-connection bookkeeping: the unmasked peer IP.
///
/// Callers choose `X-Forwarded-For` freely, so it never feeds this key.
pub fn peer_key(extensions: &Extensions) -> String {
    peer_addr(extensions)
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Whether `X-Forwarded-For` is trusted when resolving clients.
#[derive(Debug, Clone, Copy)]
pub struct ClientResolver {
    pub trust_forwarded_for: bool,
}

/// Middleware attaching [`ClientAddr`] to every request.
pub async fn resolve_client(
    State(resolver): State<ClientResolver>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let peer = peer_addr(request.extensions());
    let client = ClientAddr::resolve(request.headers(), peer, resolver.trust_forwarded_for);
    request.extensions_mut().insert(client);
    next.run(request).await
}

/// The request ID set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

pub fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
