// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Enumeration Session Wiring
 * Collaborator handles shared by the pipeline data stages
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::asn_cache::AsnCache;
use crate::config::Config;
use crate::graph::GraphStore;
use crate::pipeline::{Context, PipelineData, TaskParams};
use crate::resolvers::{ResolverPool, TrustedResolverPool};
use crate::types::OutboundRequest;
use async_trait::async_trait;
use std::sync::Arc;

/// Seed source feeding the head of the pipeline. Stages hold a non-owning
/// handle to it so derived candidates can be re-injected without cyclic
/// ownership.
#[async_trait]
pub trait NameSource: Send + Sync {
    async fn pipeline_data(&self, ctx: &Context, data: PipelineData, params: &TaskParams);
}

/// Delivery surface for events leaving the pipeline.
pub trait EventSink: Send + Sync {
    /// Deliver a request to subscribed handlers (data sources, output).
    fn send_request(&self, req: OutboundRequest);

    /// Report an answer address so the enumeration can re-check wildcards
    /// it may have missed.
    fn missed_wildcard(&self, address: &str);
}

/// Shared collaborator handles for one enumeration session.
pub struct Session {
    pub config: Arc<Config>,
    pub graph: Arc<dyn GraphStore>,
    pub asn_cache: Arc<AsnCache>,
    pub resolvers: Arc<dyn ResolverPool>,
    pub trusted_resolvers: Arc<dyn TrustedResolverPool>,
    pub name_src: Arc<dyn NameSource>,
    pub sink: Arc<dyn EventSink>,
}

impl Session {
    /// Session identity stamped on graph writes.
    pub fn uuid(&self) -> String {
        self.config.uuid.to_string()
    }
}
