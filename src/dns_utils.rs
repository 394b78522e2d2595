// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches any plausible subdomain name embedded in free-form text, such as
/// TXT or SOA answer payloads.
static SUBDOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(([a-zA-Z0-9]|[_a-zA-Z0-9][_a-zA-Z0-9-]{0,61}[a-zA-Z0-9])\.)+[a-zA-Z]{2,61}")
        .expect("subdomain regex")
});

/// Canonical form used everywhere in the pipeline: trimmed, lowercase, no
/// surrounding dots.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().trim_matches('.').to_string()
}

/// Extract candidate subdomain names from unvalidated payload text. Matches
/// are raw; callers gate them on scope membership.
pub fn find_subdomains(data: &str) -> Vec<String> {
    SUBDOMAIN_RE
        .find_iter(data)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Registrable domain (effective TLD plus one) for an FQDN, per the public
/// suffix list.
pub fn registrable_domain(fqdn: &str) -> Option<String> {
    let name = normalize_name(fqdn);
    psl::domain_str(&name).map(|d| d.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_dots_and_case() {
        assert_eq!(normalize_name("WWW.Example.COM."), "www.example.com");
        assert_eq!(normalize_name("  cdn.example.net.  "), "cdn.example.net");
        assert_eq!(normalize_name("plain"), "plain");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_name("Mail.Example.ORG.");
        assert_eq!(normalize_name(&once), once);
    }

    #[test]
    fn test_find_subdomains_in_payload() {
        let data = "v=spf1 include:_spf.example.com a:mail.example.org ~all";
        let found = find_subdomains(data);
        assert!(found.iter().any(|s| s == "_spf.example.com"));
        assert!(found.iter().any(|s| s == "mail.example.org"));
    }

    #[test]
    fn test_find_subdomains_ignores_plain_words() {
        assert!(find_subdomains("no names here").is_empty());
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(
            registrable_domain("a.b.example.co.uk"),
            Some("example.co.uk".to_string())
        );
        assert_eq!(
            registrable_domain("CDN.Example.NET."),
            Some("example.net".to_string())
        );
        assert_eq!(registrable_domain("localhost"), None);
    }
}
