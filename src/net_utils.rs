// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Network Address Helpers
 * Address extraction, reserved-range classification, prefix synthesis
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;

/// Description recorded for addresses inside IANA-reserved ranges.
pub const RESERVED_CIDR_DESCRIPTION: &str = "Reserved Network Address Blocks";

/// Matches dotted-quad IPv4 literals in unvalidated payload text.
static IPV4_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)[.]){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)")
        .expect("ipv4 regex")
});

/// IANA-reserved, private, loopback, link-local, and documentation ranges
/// for which AS lookups are skipped.
static RESERVED_CIDRS: Lazy<Vec<IpNetwork>> = Lazy::new(|| {
    [
        "0.0.0.0/8",
        "10.0.0.0/8",
        "100.64.0.0/10",
        "127.0.0.0/8",
        "169.254.0.0/16",
        "172.16.0.0/12",
        "192.0.0.0/24",
        "192.0.2.0/24",
        "192.88.99.0/24",
        "192.168.0.0/16",
        "198.18.0.0/15",
        "198.51.100.0/24",
        "203.0.113.0/24",
        "224.0.0.0/4",
        "240.0.0.0/4",
        "::1/128",
        "2001:db8::/32",
        "fc00::/7",
        "fe80::/10",
        "ff00::/8",
    ]
    .iter()
    .map(|cidr| cidr.parse().expect("reserved CIDR"))
    .collect()
});

/// Extract raw IPv4 literals from payload text. No validation beyond the
/// dotted-quad shape; callers treat these as candidates.
pub fn find_ipv4_addresses(data: &str) -> Vec<String> {
    IPV4_RE
        .find_iter(data)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// The reserved CIDR containing `addr`, if any.
pub fn is_reserved_address(addr: &str) -> Option<String> {
    let ip: IpAddr = addr.parse().ok()?;
    RESERVED_CIDRS
        .iter()
        .find(|net| net.contains(ip))
        .map(|net| net.to_string())
}

/// Synthesize a placeholder prefix for an address with no known AS data:
/// the /24 containing an IPv4 address, or the /48 containing an IPv6 one.
pub fn fake_prefix(addr: &str) -> Option<String> {
    let ip: IpAddr = addr.parse().ok()?;
    let net = match ip {
        IpAddr::V4(v4) => IpNetwork::V4(Ipv4Network::new(v4, 24).ok()?),
        IpAddr::V6(v6) => IpNetwork::V6(Ipv6Network::new(v6, 48).ok()?),
    };
    Some(format!("{}/{}", net.network(), net.prefix()))
}

/// First address of a CIDR prefix, used as the cache key for synthesized
/// AS records.
pub fn network_start(prefix: &str) -> Option<String> {
    let net: IpNetwork = prefix.parse().ok()?;
    Some(net.network().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_ipv4_addresses() {
        let data = "server at 192.0.2.15 fallback 198.51.100.7, bogus 999.1.2.3";
        let found = find_ipv4_addresses(data);
        assert!(found.contains(&"192.0.2.15".to_string()));
        assert!(found.contains(&"198.51.100.7".to_string()));
        assert!(!found.contains(&"999.1.2.3".to_string()));
    }

    #[test]
    fn test_reserved_classification() {
        assert_eq!(is_reserved_address("10.0.0.1"), Some("10.0.0.0/8".to_string()));
        assert_eq!(
            is_reserved_address("192.168.4.20"),
            Some("192.168.0.0/16".to_string())
        );
        assert_eq!(is_reserved_address("fe80::1"), Some("fe80::/10".to_string()));
        assert_eq!(is_reserved_address("93.184.216.34"), None);
        assert_eq!(is_reserved_address("not-an-ip"), None);
    }

    #[test]
    fn test_fake_prefix_v4() {
        assert_eq!(
            fake_prefix("198.51.100.7"),
            Some("198.51.100.0/24".to_string())
        );
    }

    #[test]
    fn test_fake_prefix_v6() {
        assert_eq!(
            fake_prefix("2001:db8:abcd:12ff::1"),
            Some("2001:db8:abcd::/48".to_string())
        );
    }

    #[test]
    fn test_network_start() {
        assert_eq!(network_start("198.51.100.0/24"), Some("198.51.100.0".to_string()));
        assert_eq!(network_start("2001:db8::/32"), Some("2001:db8::".to_string()));
        assert_eq!(network_start("bogus"), None);
    }
}
