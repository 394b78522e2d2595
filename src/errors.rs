// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Pipeline Error Types
 * Per-record error taxonomy for the data stages
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::RecordKind;
use thiserror::Error;

/// Errors raised while interpreting a single resolved record.
///
/// None of these are fatal to the engine: the data manager logs them through
/// the configured subscriber and moves on, aborting only the remaining
/// records of the current request where the taxonomy says so.
#[derive(Error, Debug)]
pub enum DataError {
    /// Answer data yielded no FQDN after normalization.
    #[error("failed to extract a FQDN from the DNS answer data")]
    EmptyFqdn,

    /// Answer data yielded no IP address after normalization.
    #[error("failed to extract an IP address from the DNS answer data")]
    EmptyAddress,

    /// SRV answer missing the service name or target.
    #[error("failed to extract service info from the DNS answer data")]
    EmptyService,

    /// Registrable-domain extraction failed for an FQDN.
    #[error("failed to extract a domain name from the FQDN")]
    DomainExtraction,

    /// The graph store rejected an upsert; aborts the remaining records of
    /// the current request.
    #[error("{store} failed to insert {kind} record: {source}")]
    Graph {
        store: String,
        kind: RecordKind,
        #[source]
        source: anyhow::Error,
    },

    /// The graph store rejected an infrastructure upsert.
    #[error("{store} failed to insert infrastructure for {address}: {source}")]
    Infrastructure {
        store: String,
        address: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type DataResult<T> = Result<T, DataError>;
