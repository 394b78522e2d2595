// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Pipeline Stage Interface
 * Stage contract, cancellation context, and named-channel dispatch
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::{AddrRequest, DnsRequest, SubdomainRequest};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{mpsc, watch};

/// Data values dispatched between pipeline stages.
///
/// Stages pass through variants they do not handle.
#[derive(Debug, Clone)]
pub enum PipelineData {
    Dns(DnsRequest),
    Addr(AddrRequest),
    Subdomain(SubdomainRequest),
}

/// Cancellation signal threaded through every stage invocation and captured
/// into deferred work.
#[derive(Clone)]
pub struct Context {
    rx: watch::Receiver<bool>,
}

/// Owner side of a [`Context`]; cancelling it aborts all holders.
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { rx }, CancelHandle { tx })
    }

    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self::new().0
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the context is cancelled. Never resolves for a context
    /// whose handle was dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Named ingress channels a stage may inject derived work into. The "root"
/// channel re-enters the head of the pipeline.
#[derive(Clone, Default)]
pub struct TaskParams {
    channels: HashMap<String, mpsc::UnboundedSender<PipelineData>>,
}

/// Channel name for the pipeline's head stage.
pub const ROOT_CHANNEL: &str = "root";

impl TaskParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, name: &str, tx: mpsc::UnboundedSender<PipelineData>) -> Self {
        self.channels.insert(name.to_string(), tx);
        self
    }

    /// Inject a datum into the named channel. Returns false when the context
    /// is cancelled, the channel is unknown, or its receiver is gone.
    pub fn send_data(&self, ctx: &Context, channel: &str, data: PipelineData) -> bool {
        if ctx.is_cancelled() {
            return false;
        }
        match self.channels.get(channel) {
            Some(tx) => tx.send(data).is_ok(),
            None => false,
        }
    }
}

/// A pipeline processing stage.
///
/// `process` is invoked once per input datum, potentially concurrently.
/// Returning `Ok(None)` swallows the datum; returning `Ok(Some(_))` forwards
/// it downstream.
#[async_trait]
pub trait Stage: Send + Sync {
    async fn process(
        &self,
        ctx: &Context,
        data: PipelineData,
        params: &TaskParams,
    ) -> Result<Option<PipelineData>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tag;

    fn subdomain(name: &str) -> PipelineData {
        PipelineData::Subdomain(SubdomainRequest {
            name: name.to_string(),
            domain: "example.com".to_string(),
            tag: Tag::Dns,
            source: "DNS".to_string(),
            times: 1,
        })
    }

    #[test]
    fn test_context_cancel() {
        let (ctx, handle) = Context::new();
        assert!(!ctx.is_cancelled());
        handle.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_background_context_stays_live() {
        let ctx = Context::background();
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_send_data_reaches_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let params = TaskParams::new().with_channel(ROOT_CHANNEL, tx);
        let ctx = Context::background();

        assert!(params.send_data(&ctx, ROOT_CHANNEL, subdomain("sub.example.com")));
        match rx.recv().await {
            Some(PipelineData::Subdomain(req)) => assert_eq!(req.name, "sub.example.com"),
            other => panic!("unexpected datum: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_data_honors_cancellation() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let params = TaskParams::new().with_channel(ROOT_CHANNEL, tx);
        let (ctx, handle) = Context::new();
        handle.cancel();

        assert!(!params.send_data(&ctx, ROOT_CHANNEL, subdomain("sub.example.com")));
    }

    #[test]
    fn test_send_data_unknown_channel() {
        let params = TaskParams::new();
        let ctx = Context::background();
        assert!(!params.send_data(&ctx, "missing", subdomain("sub.example.com")));
    }
}
