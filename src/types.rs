// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Enumeration Request Types
 * Value types flowing through the data pipeline
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};

/// DNS record types the pipeline dispatches on.
///
/// SPF (type 99) is long deprecated on the wire but still shows up in stored
/// answers, so it keeps a named variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    A,
    Ns,
    Cname,
    Soa,
    Ptr,
    Mx,
    Txt,
    Aaaa,
    Srv,
    Spf,
}

impl RecordKind {
    /// The RFC-assigned wire value for this record type.
    pub fn value(&self) -> u16 {
        match self {
            RecordKind::A => 1,
            RecordKind::Ns => 2,
            RecordKind::Cname => 5,
            RecordKind::Soa => 6,
            RecordKind::Ptr => 12,
            RecordKind::Mx => 15,
            RecordKind::Txt => 16,
            RecordKind::Aaaa => 28,
            RecordKind::Srv => 33,
            RecordKind::Spf => 99,
        }
    }

    pub fn from_value(value: u16) -> Option<Self> {
        match value {
            1 => Some(RecordKind::A),
            2 => Some(RecordKind::Ns),
            5 => Some(RecordKind::Cname),
            6 => Some(RecordKind::Soa),
            12 => Some(RecordKind::Ptr),
            15 => Some(RecordKind::Mx),
            16 => Some(RecordKind::Txt),
            28 => Some(RecordKind::Aaaa),
            33 => Some(RecordKind::Srv),
            99 => Some(RecordKind::Spf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Ns => "NS",
            RecordKind::Cname => "CNAME",
            RecordKind::Soa => "SOA",
            RecordKind::Ptr => "PTR",
            RecordKind::Mx => "MX",
            RecordKind::Txt => "TXT",
            RecordKind::Aaaa => "AAAA",
            RecordKind::Srv => "SRV",
            RecordKind::Spf => "SPF",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discovery method that produced a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Alt,
    Api,
    Axfr,
    Brute,
    Cert,
    Dns,
    External,
    Rir,
    Scrape,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Alt => "alt",
            Tag::Api => "api",
            Tag::Axfr => "axfr",
            Tag::Brute => "brute",
            Tag::Cert => "cert",
            Tag::Dns => "dns",
            Tag::External => "external",
            Tag::Rir => "rir",
            Tag::Scrape => "scrape",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answer record attached to a resolved name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub kind: RecordKind,
    pub data: String,
}

/// A DNS name moving through the pipeline, with any records attached by the
/// resolver stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsRequest {
    /// Fully qualified name, lowercase, no trailing dot.
    pub name: String,
    /// Registrable domain the name falls under.
    pub domain: String,
    #[serde(default)]
    pub records: Vec<Record>,
    pub tag: Tag,
    pub source: String,
}

/// An IP address extracted from answer data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddrRequest {
    pub address: String,
    pub in_scope: bool,
    pub domain: String,
    pub tag: Tag,
    pub source: String,
}

/// A proper subdomain promoted for recursive enumeration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubdomainRequest {
    pub name: String,
    pub domain: String,
    pub tag: Tag,
    pub source: String,
    /// How many times this subdomain has been observed so far.
    pub times: u32,
}

/// A name that passed every classifier filter, mirrored out to subscribed
/// handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRequest {
    pub name: String,
    pub domain: String,
    pub records: Vec<Record>,
    pub tag: Tag,
    pub source: String,
}

/// Autonomous system data for an address, either requested or resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsnRequest {
    pub address: String,
    pub asn: u32,
    /// CIDR prefix the address belongs to.
    pub prefix: String,
    pub description: String,
    pub tag: Tag,
    pub source: String,
}

impl AsnRequest {
    /// A lookup trigger carrying only the address; AS fields are filled in by
    /// whichever source answers.
    pub fn for_address(address: &str) -> Self {
        Self {
            address: address.to_string(),
            asn: 0,
            prefix: String::new(),
            description: String::new(),
            tag: Tag::Rir,
            source: String::new(),
        }
    }
}

/// Requests delivered to subscribed handlers outside the pipeline.
#[derive(Debug, Clone)]
pub enum OutboundRequest {
    Subdomain(SubdomainRequest),
    Resolved(ResolvedRequest),
    Asn(AsnRequest),
}
