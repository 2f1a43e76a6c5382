//! Request inspection.
//!
//! # Responsibilities
//! - Resolve the client IP behind Cloudflare or a forwarding proxy
//! - Parse the `full` flag of health requests
//!
//! # Design Decisions
//! - Forwarding headers are trusted only when they carry a public address
//! - Unparseable input falls back to safe defaults, never to an error

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use axum::http::HeaderMap;

pub const CF_CONNECTING_IP: &str = "cf-connecting-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Address recorded when nothing better is known.
pub const FALLBACK_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Resolve the client address.
///
/// Sources in order: `CF-Connecting-IP`, the peer address, `X-Forwarded-For`.
/// Each source may hold a comma-separated list; the first entry that is
/// `::1` (reported as `127.0.0.1`) or a public address wins.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    let sources = [
        header(CF_CONNECTING_IP),
        peer.map(|addr| addr.ip().to_string()),
        header(X_FORWARDED_FOR),
    ];

    sources
        .iter()
        .flatten()
        .flat_map(|value| value.split(','))
        .find_map(|candidate| {
            let ip: IpAddr = candidate.trim().parse().ok()?;
            if ip == IpAddr::V6(Ipv6Addr::LOCALHOST) {
                Some(FALLBACK_IP)
            } else if is_public(ip) {
                Some(ip)
            } else {
                None
            }
        })
        .unwrap_or(FALLBACK_IP)
}

/// Not private and not reserved.
pub fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let first = v4.octets()[0];
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || first == 0
                || first >= 240)
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            let unique_local = first & 0xfe00 == 0xfc00;
            let link_local = first & 0xffc0 == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}

/// Whether the query string asks for the full health report.
///
/// Accepted values for `full`: `1`, `true`, `yes`, `on` (case-insensitive).
pub fn wants_full_report(query: Option<&str>) -> bool {
    let Some(query) = query else {
        return false;
    };
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "full")
        .is_some_and(|(_, value)| {
            matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
        })
}
