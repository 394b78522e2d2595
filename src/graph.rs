// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Graph Store Interface
 * Idempotent upsert surface persisted by the outer storage layer
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::pipeline::Context;
use anyhow::Result;
use async_trait::async_trait;

/// Persistent store of name/address relationships discovered during an
/// enumeration session.
///
/// Every upsert is idempotent: the pipeline re-submits relationships on
/// duplicate observations and relies on the store to absorb them. All calls
/// must be safe under concurrent invocation and should honor the request
/// context.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Identity used when logging store failures.
    fn name(&self) -> &str {
        "graph"
    }

    async fn upsert_cname(
        &self,
        ctx: &Context,
        fqdn: &str,
        target: &str,
        source: &str,
        uuid: &str,
    ) -> Result<()>;

    async fn upsert_a(
        &self,
        ctx: &Context,
        fqdn: &str,
        addr: &str,
        source: &str,
        uuid: &str,
    ) -> Result<()>;

    async fn upsert_aaaa(
        &self,
        ctx: &Context,
        fqdn: &str,
        addr: &str,
        source: &str,
        uuid: &str,
    ) -> Result<()>;

    async fn upsert_ptr(
        &self,
        ctx: &Context,
        fqdn: &str,
        target: &str,
        source: &str,
        uuid: &str,
    ) -> Result<()>;

    async fn upsert_srv(
        &self,
        ctx: &Context,
        fqdn: &str,
        service: &str,
        target: &str,
        source: &str,
        uuid: &str,
    ) -> Result<()>;

    async fn upsert_ns(
        &self,
        ctx: &Context,
        fqdn: &str,
        target: &str,
        source: &str,
        uuid: &str,
    ) -> Result<()>;

    async fn upsert_mx(
        &self,
        ctx: &Context,
        fqdn: &str,
        target: &str,
        source: &str,
        uuid: &str,
    ) -> Result<()>;

    async fn upsert_infrastructure(
        &self,
        ctx: &Context,
        asn: u32,
        description: &str,
        addr: &str,
        prefix: &str,
        source: &str,
        uuid: &str,
    ) -> Result<()>;

    /// Whether the given subdomain is already known to be a CNAME node.
    async fn is_cname_node(&self, ctx: &Context, fqdn: &str) -> bool;
}
