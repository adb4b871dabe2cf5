//! Admin gate: the log endpoints are reachable from the local machine only,
//! unless remote admin was explicitly allowed at startup (the deployment
//! analog of running behind a trusted platform gateway).

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Map};

use crate::error::ApiError;
use crate::server::AppState;

/// The authorization predicate, kept pure so it is testable without sockets.
pub fn is_authorized(peer: IpAddr, allow_remote_admin: bool) -> bool {
    allow_remote_admin || peer.is_loopback()
}

/// Middleware guarding the admin routes.
pub async fn admin_only(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    if is_authorized(addr.ip(), state.allow_remote_admin) {
        return next.run(req).await;
    }

    let mut meta = Map::new();
    meta.insert("endpoint".into(), json!(req.uri().path()));
    meta.insert("method".into(), json!(req.method().as_str()));
    meta.insert("ip".into(), json!(addr.ip().to_string()));
    state.writer.warn("Unauthorized admin access attempt", meta);

    ApiError::ip_restricted().into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn loopback_peers_are_authorized() {
        assert!(is_authorized(IpAddr::V4(Ipv4Addr::LOCALHOST), false));
        assert!(is_authorized(IpAddr::V6(Ipv6Addr::LOCALHOST), false));
        assert!(is_authorized(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 53)), false));
    }

    #[test]
    fn remote_peers_are_rejected() {
        assert!(!is_authorized(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)), false));
        assert!(!is_authorized(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)), false));
        assert!(!is_authorized(
            IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1)),
            false
        ));
    }

    #[test]
    fn allow_remote_admin_bypasses_the_ip_check() {
        assert!(is_authorized(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)), true));
    }
}
