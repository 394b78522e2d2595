// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Resolver Pool Interface
 * Query surface of the general and trusted resolver pools
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::pipeline::Context;
use crate::types::{Record, RecordKind};
use anyhow::Result;
use async_trait::async_trait;
use hickory_resolver::proto::op::ResponseCode;

/// Query types attempted when probing a freshly derived name.
pub const INITIAL_QUERY_TYPES: [RecordKind; 2] = [RecordKind::A, RecordKind::Aaaa];

/// A single-question DNS query.
#[derive(Debug, Clone)]
pub struct DnsQuery {
    pub name: String,
    pub qtype: RecordKind,
}

impl DnsQuery {
    pub fn new(name: &str, qtype: RecordKind) -> Self {
        Self {
            name: name.to_string(),
            qtype,
        }
    }
}

/// The answered portion of a resolver response.
#[derive(Debug, Clone)]
pub struct DnsResponse {
    pub rcode: ResponseCode,
    pub answers: Vec<Record>,
}

impl DnsResponse {
    pub fn is_success(&self) -> bool {
        self.rcode == ResponseCode::NoError
    }

    pub fn is_name_error(&self) -> bool {
        self.rcode == ResponseCode::NXDomain
    }
}

/// A pool of resolvers executing blocking queries on behalf of the pipeline.
#[async_trait]
pub trait ResolverPool: Send + Sync {
    /// Executes the query and waits for the pool's answer.
    async fn query_blocking(&self, ctx: &Context, msg: &DnsQuery) -> Result<DnsResponse>;
}

/// The trusted pool additionally owns wildcard detection for a domain.
#[async_trait]
pub trait TrustedResolverPool: ResolverPool {
    /// Whether the response looks synthesized by a wildcard under `domain`.
    async fn wildcard_detected(&self, ctx: &Context, resp: &DnsResponse, domain: &str) -> bool;
}
