// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Pipeline Data Manager
 * Terminal stage: interprets resolved answers, writes graph edges, feeds
 * discovered targets back into the pipeline, and enriches addresses with
 * AS data through a bounded wait-and-poll worker
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::dedup::StableBloomFilter;
use crate::dns_utils::{self, normalize_name};
use crate::errors::DataError;
use crate::net_utils;
use crate::pipeline::{Context, PipelineData, Stage, TaskParams};
use crate::session::Session;
use crate::types::{AddrRequest, AsnRequest, DnsRequest, OutboundRequest, RecordKind, Tag};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Upper bound on cache polls for one queued address.
const ASN_POLL_ATTEMPTS: u32 = 30;

/// Pause between cache polls.
const ASN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// An address awaiting AS data, carrying the context captured when it was
/// queued so aborts still reach the deferred graph writes.
struct QueuedAddrRequest {
    ctx: Context,
    req: AddrRequest,
}

/// Terminal pipeline stage that stores all data produced by the enumeration.
///
/// Side effects (graph writes, feedback injection, AS enrichment) run on
/// every observation; the dedup filter only gates downstream forwarding, so
/// the graph store sees duplicates and absorbs them through idempotent
/// upserts.
pub struct DataManager {
    session: Arc<Session>,
    filter: Mutex<StableBloomFilter>,
    queue_tx: mpsc::UnboundedSender<QueuedAddrRequest>,
    signal_done: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DataManager {
    /// Create the stage and start its AS enrichment worker.
    pub fn new(session: Arc<Session>) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (signal_done, done_rx) = watch::channel(false);
        let worker = tokio::spawn(asn_worker(session.clone(), queue_rx, done_rx));

        Self {
            session,
            filter: Mutex::new(StableBloomFilter::default()),
            queue_tx,
            signal_done,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Reset the dedup filter, then wait for the worker to drain its queue.
    /// Call exactly once.
    pub async fn stop(&self) {
        self.filter.lock().reset();
        let _ = self.signal_done.send(true);

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    async fn dns_request(
        &self,
        ctx: &Context,
        req: &mut DnsRequest,
        params: &TaskParams,
    ) -> Result<(), DataError> {
        if self.session.config.blacklisted(&req.name) {
            return Ok(());
        }

        // Normalize in record order and handle a CNAME before anything else:
        // chained CNAMEs resolve one link per cycle, untangled from side
        // records.
        for i in 0..req.records.len() {
            req.records[i].name = normalize_name(&req.records[i].name);
            req.records[i].data = normalize_name(&req.records[i].data);

            if req.records[i].kind == RecordKind::Cname {
                return self.insert_cname(ctx, req, i, params).await;
            }
        }

        for i in 0..req.records.len() {
            if ctx.is_cancelled() {
                return Ok(());
            }

            match req.records[i].kind {
                RecordKind::A => self.insert_addr(ctx, req, i, params).await?,
                RecordKind::Aaaa => self.insert_addr(ctx, req, i, params).await?,
                RecordKind::Ptr => self.insert_ptr(ctx, req, i, params).await?,
                RecordKind::Srv => self.insert_srv(ctx, req, i, params).await?,
                RecordKind::Ns => self.insert_ns_or_mx(ctx, req, i, params).await?,
                RecordKind::Mx => self.insert_ns_or_mx(ctx, req, i, params).await?,
                RecordKind::Txt | RecordKind::Soa | RecordKind::Spf => {
                    self.insert_payload(ctx, req, i, params).await?
                }
                // A CNAME would have short-circuited the request already.
                RecordKind::Cname => {}
            }
        }
        Ok(())
    }

    async fn insert_cname(
        &self,
        ctx: &Context,
        req: &DnsRequest,
        idx: usize,
        params: &TaskParams,
    ) -> Result<(), DataError> {
        let target = req.records[idx].data.clone();
        if target.is_empty() {
            return Err(DataError::EmptyFqdn);
        }
        let domain = dns_utils::registrable_domain(&target).ok_or(DataError::DomainExtraction)?;

        // The target re-enters the pipeline so the chain is followed until an
        // address record appears.
        self.session
            .name_src
            .pipeline_data(
                ctx,
                PipelineData::Dns(DnsRequest {
                    name: target.clone(),
                    domain: domain.to_lowercase(),
                    records: Vec::new(),
                    tag: Tag::Dns,
                    source: "DNS".to_string(),
                }),
                params,
            )
            .await;

        self.session
            .graph
            .upsert_cname(ctx, &req.name, &target, &req.source, &self.session.uuid())
            .await
            .map_err(|err| DataError::Graph {
                store: self.session.graph.name().to_string(),
                kind: RecordKind::Cname,
                source: err,
            })
    }

    async fn insert_addr(
        &self,
        ctx: &Context,
        req: &DnsRequest,
        idx: usize,
        params: &TaskParams,
    ) -> Result<(), DataError> {
        let addr = req.records[idx].data.clone();
        if addr.is_empty() {
            return Err(DataError::EmptyAddress);
        }

        self.session.sink.missed_wildcard(&addr);
        self.session
            .name_src
            .pipeline_data(
                ctx,
                PipelineData::Addr(AddrRequest {
                    address: addr.clone(),
                    in_scope: true,
                    domain: req.domain.clone(),
                    tag: Tag::Dns,
                    source: "DNS".to_string(),
                }),
                params,
            )
            .await;

        let kind = req.records[idx].kind;
        let result = match kind {
            RecordKind::Aaaa => {
                self.session
                    .graph
                    .upsert_aaaa(ctx, &req.name, &addr, &req.source, &self.session.uuid())
                    .await
            }
            _ => {
                self.session
                    .graph
                    .upsert_a(ctx, &req.name, &addr, &req.source, &self.session.uuid())
                    .await
            }
        };
        result.map_err(|err| DataError::Graph {
            store: self.session.graph.name().to_string(),
            kind,
            source: err,
        })
    }

    async fn insert_ptr(
        &self,
        ctx: &Context,
        req: &DnsRequest,
        idx: usize,
        params: &TaskParams,
    ) -> Result<(), DataError> {
        let target = req.records[idx].data.clone();
        if target.is_empty() {
            return Err(DataError::EmptyFqdn);
        }

        // Reverse records only matter when the forward name is ours.
        let Some(domain) = self.session.config.which_domain(&target) else {
            return Ok(());
        };
        let domain = domain.to_lowercase();

        // Allows the target name to be resolved in the forward direction.
        self.session
            .name_src
            .pipeline_data(
                ctx,
                PipelineData::Dns(DnsRequest {
                    name: target.clone(),
                    domain,
                    records: Vec::new(),
                    tag: Tag::Dns,
                    source: "Reverse DNS".to_string(),
                }),
                params,
            )
            .await;

        self.session
            .graph
            .upsert_ptr(ctx, &req.name, &target, &req.source, &self.session.uuid())
            .await
            .map_err(|err| DataError::Graph {
                store: self.session.graph.name().to_string(),
                kind: RecordKind::Ptr,
                source: err,
            })
    }

    async fn insert_srv(
        &self,
        ctx: &Context,
        req: &DnsRequest,
        idx: usize,
        params: &TaskParams,
    ) -> Result<(), DataError> {
        let service = req.records[idx].name.clone();
        let target = req.records[idx].data.clone();
        if service.is_empty() || target.is_empty() {
            return Err(DataError::EmptyService);
        }

        if let Some(domain) = self.session.config.which_domain(&target) {
            let domain = domain.to_string();
            self.session
                .name_src
                .pipeline_data(
                    ctx,
                    PipelineData::Dns(DnsRequest {
                        name: target.clone(),
                        domain,
                        records: Vec::new(),
                        tag: Tag::Dns,
                        source: "DNS".to_string(),
                    }),
                    params,
                )
                .await;
        }

        self.session
            .graph
            .upsert_srv(ctx, &req.name, &service, &target, &req.source, &self.session.uuid())
            .await
            .map_err(|err| DataError::Graph {
                store: self.session.graph.name().to_string(),
                kind: RecordKind::Srv,
                source: err,
            })
    }

    async fn insert_ns_or_mx(
        &self,
        ctx: &Context,
        req: &DnsRequest,
        idx: usize,
        params: &TaskParams,
    ) -> Result<(), DataError> {
        let kind = req.records[idx].kind;
        let target = req.records[idx].data.clone();
        if target.is_empty() {
            return Err(DataError::EmptyFqdn);
        }
        let domain = dns_utils::registrable_domain(&target).ok_or(DataError::DomainExtraction)?;

        let domain = domain.to_lowercase();
        if target != domain {
            self.session
                .name_src
                .pipeline_data(
                    ctx,
                    PipelineData::Dns(DnsRequest {
                        name: target.clone(),
                        domain: domain.clone(),
                        records: Vec::new(),
                        tag: Tag::Dns,
                        source: "DNS".to_string(),
                    }),
                    params,
                )
                .await;
        }

        let result = match kind {
            RecordKind::Mx => {
                self.session
                    .graph
                    .upsert_mx(ctx, &req.name, &target, &req.source, &self.session.uuid())
                    .await
            }
            _ => {
                self.session
                    .graph
                    .upsert_ns(ctx, &req.name, &target, &req.source, &self.session.uuid())
                    .await
            }
        };
        result.map_err(|err| DataError::Graph {
            store: self.session.graph.name().to_string(),
            kind,
            source: err,
        })
    }

    /// TXT, SOA, and SPF payloads are not stored, but in-scope names get
    /// their text scanned for embedded addresses and subdomain names.
    async fn insert_payload(
        &self,
        ctx: &Context,
        req: &DnsRequest,
        idx: usize,
        params: &TaskParams,
    ) -> Result<(), DataError> {
        if self.session.config.is_domain_in_scope(&req.name) {
            self.find_names_and_addresses(ctx, &req.records[idx].data, &req.domain, params)
                .await;
        }
        Ok(())
    }

    async fn find_names_and_addresses(
        &self,
        ctx: &Context,
        data: &str,
        domain: &str,
        params: &TaskParams,
    ) {
        for ip in net_utils::find_ipv4_addresses(data) {
            self.session
                .name_src
                .pipeline_data(
                    ctx,
                    PipelineData::Addr(AddrRequest {
                        address: ip,
                        in_scope: false,
                        domain: domain.to_string(),
                        tag: Tag::Dns,
                        source: "DNS".to_string(),
                    }),
                    params,
                )
                .await;
        }

        for name in dns_utils::find_subdomains(data) {
            let Some(found) = self.session.config.which_domain(&name) else {
                continue;
            };
            let found = found.to_lowercase();
            self.session
                .name_src
                .pipeline_data(
                    ctx,
                    PipelineData::Dns(DnsRequest {
                        name,
                        domain: found,
                        records: Vec::new(),
                        tag: Tag::Dns,
                        source: "DNS".to_string(),
                    }),
                    params,
                )
                .await;
        }
    }

    async fn addr_request(&self, ctx: &Context, req: &AddrRequest) -> Result<(), DataError> {
        if ctx.is_cancelled() {
            return Ok(());
        }
        if !req.in_scope || self.session.config.uuid.is_nil() {
            return Ok(());
        }

        if let Some(prefix) = net_utils::is_reserved_address(&req.address) {
            return self
                .upsert_infrastructure(
                    ctx,
                    0,
                    net_utils::RESERVED_CIDR_DESCRIPTION,
                    &req.address,
                    &prefix,
                    "RIR",
                )
                .await;
        }

        if let Some(record) = self.session.asn_cache.addr_search(&req.address) {
            return self
                .upsert_infrastructure(
                    ctx,
                    record.asn,
                    &record.description,
                    &req.address,
                    &record.prefix,
                    &record.source,
                )
                .await;
        }

        // No AS data yet; the worker owns the wait-and-poll protocol.
        let _ = self.queue_tx.send(QueuedAddrRequest {
            ctx: ctx.clone(),
            req: req.clone(),
        });
        Ok(())
    }

    async fn upsert_infrastructure(
        &self,
        ctx: &Context,
        asn: u32,
        description: &str,
        addr: &str,
        prefix: &str,
        source: &str,
    ) -> Result<(), DataError> {
        self.session
            .graph
            .upsert_infrastructure(ctx, asn, description, addr, prefix, source, &self.session.uuid())
            .await
            .map_err(|err| DataError::Infrastructure {
                store: self.session.graph.name().to_string(),
                address: addr.to_string(),
                source: err,
            })
    }
}

#[async_trait]
impl Stage for DataManager {
    async fn process(
        &self,
        ctx: &Context,
        data: PipelineData,
        params: &TaskParams,
    ) -> Result<Option<PipelineData>> {
        if ctx.is_cancelled() {
            return Ok(None);
        }

        let mut data = data;
        let id = match &mut data {
            PipelineData::Dns(req) => {
                let id = req.name.clone();
                if let Err(err) = self.dns_request(ctx, req, params).await {
                    warn!(name = %req.name, %err, "dns request handling");
                }
                id
            }
            PipelineData::Addr(req) => {
                let id = req.address.clone();
                if let Err(err) = self.addr_request(ctx, req).await {
                    warn!(address = %req.address, %err, "address request handling");
                }
                id
            }
            _ => return Ok(Some(data)),
        };

        // Dedup happens after the side effects so the graph store observes
        // every pass; the filter only gates downstream forwarding.
        if !id.is_empty() && self.filter.lock().test_and_add(id.as_bytes()) {
            return Ok(None);
        }
        Ok(Some(data))
    }
}

/// Background worker consuming queued addresses one at a time. Exits only
/// after a shutdown signal has been observed and the queue is empty.
async fn asn_worker(
    session: Arc<Session>,
    mut queue: mpsc::UnboundedReceiver<QueuedAddrRequest>,
    mut done: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            entry = queue.recv() => match entry {
                Some(entry) => next_infra_info(&session, entry).await,
                None => break,
            },
            _ = done.changed() => {
                while let Ok(entry) = queue.try_recv() {
                    next_infra_info(&session, entry).await;
                }
                break;
            }
        }
    }
    debug!("ASN worker drained and stopped");
}

async fn next_infra_info(session: &Session, entry: QueuedAddrRequest) {
    let QueuedAddrRequest { ctx, req } = entry;
    let uuid = session.uuid();

    // Another path may have populated the cache while this entry waited.
    if let Some(record) = session.asn_cache.addr_search(&req.address) {
        upsert_infra(session, &ctx, &record, &req.address, &uuid).await;
        return;
    }

    // Ask the AS lookup sources to fill the cache, then poll for the answer.
    session
        .sink
        .send_request(OutboundRequest::Asn(AsnRequest::for_address(&req.address)));

    for _ in 0..ASN_POLL_ATTEMPTS {
        if let Some(record) = session.asn_cache.addr_search(&req.address) {
            upsert_infra(session, &ctx, &record, &req.address, &uuid).await;
            return;
        }
        tokio::time::sleep(ASN_POLL_INTERVAL).await;
    }

    // Nothing answered inside the budget; fall back to a placeholder so the
    // address still gets exactly one infrastructure edge.
    let Some(prefix) = net_utils::fake_prefix(&req.address) else {
        warn!(address = %req.address, "unable to synthesize a prefix");
        return;
    };
    let placeholder = AsnRequest {
        address: req.address.clone(),
        asn: 0,
        prefix: prefix.clone(),
        description: "Unknown".to_string(),
        tag: Tag::Rir,
        source: "RIR".to_string(),
    };
    upsert_infra(session, &ctx, &placeholder, &req.address, &uuid).await;

    // Cache the placeholder under the network start so every address in the
    // synthesized prefix hits immediately from now on.
    if let Some(start) = net_utils::network_start(&prefix) {
        session.asn_cache.update(&AsnRequest {
            address: start,
            ..placeholder
        });
    }
}

async fn upsert_infra(
    session: &Session,
    ctx: &Context,
    record: &AsnRequest,
    addr: &str,
    uuid: &str,
) {
    if let Err(err) = session
        .graph
        .upsert_infrastructure(
            ctx,
            record.asn,
            &record.description,
            addr,
            &record.prefix,
            &record.source,
            uuid,
        )
        .await
    {
        debug!(address = %addr, %err, "infrastructure upsert");
    }
}
