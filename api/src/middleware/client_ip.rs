//! Caller address resolution

use std::net::IpAddr;

use actix_web::HttpRequest;

/// Resolve the caller's address.
///
/// Forwarding headers are only honoured behind a trusted reverse proxy;
/// otherwise any client could pick its own rate limiting key. Returns `None`
/// when no parseable address is available.
pub fn client_ip(req: &HttpRequest, trust_proxy_headers: bool) -> Option<IpAddr> {
    if trust_proxy_headers {
        // First entry of X-Forwarded-For is the original client
        let forwarded = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|ip| ip.trim().parse().ok());
        if forwarded.is_some() {
            return forwarded;
        }

        let real_ip = req
            .headers()
            .get("X-Real-IP")
            .and_then(|value| value.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok());
        if real_ip.is_some() {
            return real_ip;
        }
    }

    req.peer_addr().map(|addr| addr.ip())
}
