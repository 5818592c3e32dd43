// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Outbound target checks shared by every probe.
//!
//! Hosts are matched on the literal string from the URL. Names are not resolved, so a
//! public name pointing at a private address is let through.

use crate::error::{ProbeError, Result};
use std::net::Ipv4Addr;
use url::Url;

/// True when probing `hostname` could reach loopback or private-network infrastructure.
///
/// Blocked: `localhost`, `0.0.0.0/8`, `10.0.0.0/8`, `127.0.0.0/8`, `172.16.0.0/12`,
/// `192.168.0.0/16`. Every other hostname or IPv4 literal is allowed.
pub fn is_forbidden_host(hostname: &str) -> bool {
    if hostname.eq_ignore_ascii_case("localhost") {
        return true;
    }

    let Ok(addr) = hostname.parse::<Ipv4Addr>() else {
        return false;
    };

    match addr.octets() {
        [0, ..] | [10, ..] | [127, ..] => true,
        [172, b, ..] => (16..=31).contains(&b),
        [192, 168, ..] => true,
        _ => false,
    }
}

/// Parse a raw probe target and apply the scheme and host checks.
///
/// Surrounding whitespace is ignored. Only absolute `http`/`https` URLs with a host pass.
pub fn parse_probe_target(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProbeError::UrlRequired);
    }

    let url = Url::parse(trimmed).map_err(|_| ProbeError::InvalidUrl)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProbeError::InvalidUrl);
    }

    let host = url.host_str().ok_or(ProbeError::InvalidUrl)?;
    if is_forbidden_host(host) {
        return Err(ProbeError::ForbiddenHost(host.to_string()));
    }

    Ok(url)
}

/// Scheme-only check used by the link handlers before a URL is stored.
pub fn is_http_url(raw: &str) -> bool {
    Url::parse(raw.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_hosts() {
        for host in [
            "localhost",
            "LocalHost",
            "127.0.0.1",
            "127.255.0.9",
            "0.0.0.0",
            "10.1.2.3",
            "172.16.0.1",
            "172.31.255.255",
            "192.168.1.1",
        ] {
            assert!(is_forbidden_host(host), "{host} should be forbidden");
        }
    }

    #[test]
    fn test_allowed_hosts() {
        for host in [
            "example.com",
            "172.15.255.255",
            "172.32.0.1",
            "192.169.0.1",
            "11.0.0.1",
            "8.8.8.8",
            "localhost.example.com",
        ] {
            assert!(!is_forbidden_host(host), "{host} should be allowed");
        }
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            parse_probe_target("   "),
            Err(ProbeError::UrlRequired)
        ));
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        for raw in ["ftp://example.com", "file:///etc/passwd", "javascript:alert(1)"] {
            assert!(matches!(parse_probe_target(raw), Err(ProbeError::InvalidUrl)));
        }
    }

    #[test]
    fn test_parse_rejects_relative() {
        assert!(matches!(
            parse_probe_target("example.com/path"),
            Err(ProbeError::InvalidUrl)
        ));
    }

    #[test]
    fn test_parse_rejects_private_literal() {
        let err = parse_probe_target("http://192.168.0.10:8080/admin").unwrap_err();
        assert!(matches!(err, ProbeError::ForbiddenHost(ref h) if h == "192.168.0.10"));
    }

    #[test]
    fn test_parse_normalizes_shorthand_ipv4() {
        // WHATWG parsing turns 127.1 into 127.0.0.1 before the guard sees it
        assert!(matches!(
            parse_probe_target("http://127.1/"),
            Err(ProbeError::ForbiddenHost(_))
        ));
    }

    #[test]
    fn test_parse_accepts_public_target() {
        let url = parse_probe_target("  https://example.com/projects  ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/projects");
    }

    #[test]
    fn test_parse_accepts_boundary_outside_range() {
        assert!(parse_probe_target("http://172.32.0.1/").is_ok());
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://example.com"));
        assert!(is_http_url("http://example.com"));
        assert!(!is_http_url("mailto:me@example.com"));
        assert!(!is_http_url("not a url"));
    }
}
