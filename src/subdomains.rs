// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Subdomain Classifier Stage
 * Counts parent subdomains, filters wildcard and CNAME parents, and decides
 * recursion eligibility for resolved names
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::pipeline::{Context, PipelineData, Stage, TaskParams, ROOT_CHANNEL};
use crate::resolvers::{DnsQuery, DnsResponse, ResolverPool, INITIAL_QUERY_TYPES};
use crate::session::Session;
use crate::types::{DnsRequest, OutboundRequest, RecordKind, ResolvedRequest, SubdomainRequest};
use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Retry budget for one forward query against one resolver pool.
const FWD_QUERY_ATTEMPTS: u32 = 50;

/// Pipeline stage handling newly discovered proper subdomain names.
pub struct SubdomainTask {
    session: Arc<Session>,
    cnames: Mutex<HashSet<String>>,
    within_wildcards: Mutex<HashSet<String>>,
    times_tx: mpsc::Sender<TimesReq>,
    done: watch::Sender<bool>,
}

struct TimesReq {
    sub: String,
    reply: oneshot::Sender<u32>,
}

impl SubdomainTask {
    /// Create the stage and start its occurrence-count manager.
    pub fn new(session: Arc<Session>) -> Self {
        let (times_tx, times_rx) = mpsc::channel(10);
        let (done, done_rx) = watch::channel(false);
        tokio::spawn(times_manager(times_rx, done_rx));

        Self {
            session,
            cnames: Mutex::new(HashSet::new()),
            within_wildcards: Mutex::new(HashSet::new()),
            times_tx,
            done,
        }
    }

    /// Release resources held by the stage. Call exactly once.
    pub fn stop(&self) {
        let _ = self.done.send(true);
        self.cnames.lock().clear();
        self.within_wildcards.lock().clear();
    }

    async fn check_for_subdomains(
        &self,
        ctx: &Context,
        req: &DnsRequest,
        params: &TaskParams,
    ) -> bool {
        let labels: Vec<&str> = req.name.split('.').collect();
        // Too small to have a proper subdomain.
        if labels.len() < 2 {
            return false;
        }
        // It cannot have fewer labels than the root domain name.
        let domain_labels = req.domain.split('.').count();
        if labels.len() - 1 < domain_labels {
            return false;
        }

        let sub = labels[1..].join(".").trim().to_string();
        let Some(times) = self.times_for_subdomain(&sub).await else {
            return false;
        };

        if times == 1 && self.sub_within_wildcard(ctx, &sub, &req.domain).await {
            self.within_wildcards.lock().insert(sub);
            return false;
        } else if times > 1 && self.within_wildcards.lock().contains(&sub) {
            return false;
        } else if times == 1 && self.session.graph.is_cname_node(ctx, &sub).await {
            self.cnames.lock().insert(sub);
            return false;
        } else if times > 1 && self.cnames.lock().contains(&sub) {
            return false;
        } else if times > self.session.config.min_for_recursive {
            // The threshold already triggered an emission on an earlier pass.
            return true;
        }

        let subreq = SubdomainRequest {
            name: sub,
            domain: req.domain.clone(),
            tag: req.tag,
            source: req.source.clone(),
            times,
        };

        self.session
            .sink
            .send_request(OutboundRequest::Subdomain(subreq.clone()));
        if times == 1 {
            params.send_data(ctx, ROOT_CHANNEL, PipelineData::Subdomain(subreq));
        }
        true
    }

    /// Probe `a.<name>` for each initial query type; the parent is within a
    /// wildcard when the trusted pool flags any answered response.
    async fn sub_within_wildcard(&self, ctx: &Context, name: &str, domain: &str) -> bool {
        for qtype in INITIAL_QUERY_TYPES {
            if ctx.is_cancelled() {
                return false;
            }

            if let Ok(resp) = self.fwd_query(ctx, &format!("a.{}", name), qtype).await {
                if !resp.answers.is_empty()
                    && self
                        .session
                        .trusted_resolvers
                        .wildcard_detected(ctx, &resp, domain)
                        .await
                {
                    return true;
                }
            }
        }
        false
    }

    async fn fwd_query(&self, ctx: &Context, name: &str, qtype: RecordKind) -> Result<DnsResponse> {
        let msg = DnsQuery::new(name, qtype);

        query_with_retries(self.session.resolvers.as_ref(), ctx, &msg).await?;

        let trusted: &dyn ResolverPool = self.session.trusted_resolvers.as_ref();
        query_with_retries(trusted, ctx, &msg).await
    }

    async fn times_for_subdomain(&self, sub: &str) -> Option<u32> {
        let (reply, rx) = oneshot::channel();
        self.times_tx
            .send(TimesReq {
                sub: sub.to_string(),
                reply,
            })
            .await
            .ok()?;
        rx.await.ok()
    }
}

#[async_trait]
impl Stage for SubdomainTask {
    async fn process(
        &self,
        ctx: &Context,
        data: PipelineData,
        params: &TaskParams,
    ) -> Result<Option<PipelineData>> {
        if ctx.is_cancelled() {
            return Ok(None);
        }

        let req = match data {
            PipelineData::Dns(req) => req,
            other => return Ok(Some(other)),
        };
        if !self.session.config.is_domain_in_scope(&req.name) {
            return Ok(None);
        }
        // Service subdomains do not seed recursion.
        for label in req.name.split('.') {
            let l = label.to_lowercase();
            if l == "_tcp" || l == "_udp" || l == "_tls" {
                return Ok(None);
            }
        }

        if self.check_for_subdomains(ctx, &req, params).await {
            self.session
                .sink
                .send_request(OutboundRequest::Resolved(ResolvedRequest {
                    name: req.name.clone(),
                    domain: req.domain.clone(),
                    records: req.records.clone(),
                    tag: req.tag,
                    source: req.source.clone(),
                }));
        }
        Ok(Some(PipelineData::Dns(req)))
    }
}

/// One forward query with the standard retry protocol: fail fast on
/// NXDOMAIN or an answered-but-empty success, retry other non-success
/// response codes up to the attempt budget.
async fn query_with_retries(
    pool: &dyn ResolverPool,
    ctx: &Context,
    msg: &DnsQuery,
) -> Result<DnsResponse> {
    let mut resp = definitive(pool.query_blocking(ctx, msg).await)?;

    let mut attempts = 1;
    while attempts < FWD_QUERY_ATTEMPTS && !resp.is_success() {
        resp = definitive(pool.query_blocking(ctx, msg).await)?;
        attempts += 1;
    }
    if !resp.is_success() {
        bail!("query failed");
    }
    Ok(resp)
}

fn definitive(result: Result<DnsResponse>) -> Result<DnsResponse> {
    let resp = match result {
        Ok(resp) => resp,
        Err(_) => bail!("name does not exist"),
    };
    if resp.is_name_error() {
        bail!("name does not exist");
    }
    if resp.is_success() && resp.answers.is_empty() {
        bail!("zero answers returned");
    }
    Ok(resp)
}

/// Sole owner of the subdomain occurrence map; every read and update flows
/// through the request channel, so counts observe message-arrival order.
async fn times_manager(mut requests: mpsc::Receiver<TimesReq>, mut done: watch::Receiver<bool>) {
    let mut subdomains: HashMap<String, u32> = HashMap::new();

    loop {
        tokio::select! {
            _ = done.changed() => return,
            req = requests.recv() => match req {
                Some(TimesReq { sub, reply }) => {
                    let times = subdomains
                        .entry(sub)
                        .and_modify(|t| *t += 1)
                        .or_insert(1);
                    let _ = reply.send(*times);
                }
                None => return,
            }
        }
    }
}
