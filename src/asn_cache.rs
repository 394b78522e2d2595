// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - ASN Cache
 * Process-local prefix-aware map from address to last-known AS data
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::AsnRequest;
use ipnetwork::IpNetwork;
use parking_lot::RwLock;
use std::net::IpAddr;
use tracing::debug;

struct CacheEntry {
    net: IpNetwork,
    record: AsnRequest,
}

/// Shared cache of announced (or synthesized) prefixes and their AS data.
///
/// Lookups match any address inside a cached prefix, so a single update
/// answers for every address in that network. Safe for concurrent use from
/// all pipeline stages.
#[derive(Default)]
pub struct AsnCache {
    entries: RwLock<Vec<CacheEntry>>,
}

impl AsnCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for the request's prefix. Requests with
    /// an unparseable prefix are dropped.
    pub fn update(&self, record: &AsnRequest) {
        let net: IpNetwork = match record.prefix.parse() {
            Ok(net) => net,
            Err(_) => {
                debug!(prefix = %record.prefix, "discarding AS record with bad prefix");
                return;
            }
        };

        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.net == net) {
            Some(entry) => entry.record = record.clone(),
            None => entries.push(CacheEntry {
                net,
                record: record.clone(),
            }),
        }
    }

    /// The cached AS record whose prefix contains `addr`, if any.
    pub fn addr_search(&self, addr: &str) -> Option<AsnRequest> {
        let ip: IpAddr = addr.parse().ok()?;
        self.entries
            .read()
            .iter()
            .find(|e| e.net.contains(ip))
            .map(|e| e.record.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
