//! Destination validation for outbound fetches
//!
//! Decides whether a URL may be fetched before any connection is made, and
//! classifies resolved addresses for the fetcher's connect-time check.

use crate::{Error, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Host names rejected by literal comparison, before any IP parsing
pub const LOOPBACK_NAMES: [&str; 3] = ["localhost", "127.0.0.1", "::1"];

/// URL schemes the fetcher is able to retrieve
pub const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Return true if `url` may be fetched
///
/// # Security
/// Rejects unparsable URLs, non-HTTP schemes, loopback names and literal
/// IPs in private, loopback or reserved ranges. Domain names are not
/// resolved here; the fetcher re-checks resolved addresses before it
/// connects.
pub fn is_safe(url: &str) -> bool {
    check_url(url).is_ok()
}

/// Parse and validate a URL, returning the parsed form when allowed
pub fn check_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::invalid_url(format!("{}: {}", raw, e)))?;
    check_parsed(&url)?;
    Ok(url)
}

/// Validate an already parsed URL (used again for every redirect hop)
pub fn check_parsed(url: &Url) -> Result<()> {
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(Error::blocked(format!(
            "scheme '{}' is not allowed",
            url.scheme()
        )));
    }

    let host = url
        .host()
        .ok_or_else(|| Error::blocked("URL has no host"))?;

    let name = match &host {
        Host::Domain(d) => d.trim_end_matches('.').to_ascii_lowercase(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    };
    if LOOPBACK_NAMES.contains(&name.as_str()) || name.ends_with(".localhost") {
        return Err(Error::blocked(format!("host '{}' is local", name)));
    }

    let ip = match host {
        Host::Ipv4(ip) => Some(IpAddr::V4(ip)),
        Host::Ipv6(ip) => Some(IpAddr::V6(ip)),
        Host::Domain(d) => d.parse::<IpAddr>().ok(),
    };
    if let Some(ip) = ip {
        if is_blocked_ip(ip) {
            return Err(Error::blocked(format!(
                "address {} is private, loopback or reserved",
                ip
            )));
        }
    }

    Ok(())
}

/// Return true if `ip` is not an ordinary public unicast address
///
/// # Security
/// Covers unspecified, loopback, private, shared, link-local,
/// documentation, benchmarking, multicast and reserved ranges. IPv6 forms
/// that embed an IPv4 address (mapped, 6to4, NAT64) are judged by the
/// embedded address.
pub fn is_blocked_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_v4(v4),
        IpAddr::V6(v6) => is_blocked_v6(v6),
    }
}

fn is_blocked_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();

    ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_multicast()
        // 0.0.0.0/8 "this network"
        || a == 0
        // 100.64.0.0/10 shared address space
        || (a == 100 && (b & 0xc0) == 64)
        // 192.0.0.0/24 IETF protocol assignments
        || (a == 192 && b == 0 && c == 0)
        // 198.18.0.0/15 benchmarking
        || (a == 198 && (b & 0xfe) == 18)
        // 240.0.0.0/4 reserved
        || a >= 240
}

fn is_blocked_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_blocked_v4(v4);
    }

    let seg = ip.segments();

    // 64:ff9b::/96 NAT64
    if seg[0] == 0x0064 && seg[1] == 0xff9b && seg[2..6] == [0, 0, 0, 0] {
        return is_blocked_v4(embedded_v4(seg[6], seg[7]));
    }

    // 2002::/16 6to4
    if seg[0] == 0x2002 {
        return is_blocked_v4(embedded_v4(seg[1], seg[2]));
    }

    // Outside 2000::/3 everything is loopback, unspecified, ULA,
    // link-local, multicast or reserved
    if seg[0] & 0xe000 != 0x2000 {
        return true;
    }

    // 2001::/23 IETF protocol assignments, 2001:db8::/32 documentation
    seg[0] == 0x2001 && (seg[1] < 0x0200 || seg[1] == 0x0db8)
}

fn embedded_v4(hi: u16, lo: u16) -> Ipv4Addr {
    let [a, b] = hi.to_be_bytes();
    let [c, d] = lo.to_be_bytes();
    Ipv4Addr::new(a, b, c, d)
}
