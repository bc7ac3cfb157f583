//! Ledger access
//!
//! The ledger is the only source of truth for record state and history. This
//! module defines what the certificate core reads from it:
//!
//! - [`LedgerRecord`]: the record state accessor's 11-field snapshot
//! - [`TimelineEvent`]: one decoded event log, typed per [`EventKind`]
//! - [`ChainReader`]: the read interface, implemented over JSON-RPC
//!   ([`RpcChainReader`]) and in memory ([`InMemoryLedger`])
//!
//! Nothing here caches. Every call reflects the ledger at call time.

pub mod abi;
pub mod memory;
pub mod rpc;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{Address, CertifyError, RecordId, Result, H256};

pub use abi::{AbiError, ContractInterface};
pub use memory::InMemoryLedger;
pub use rpc::{LedgerContext, RpcChainReader};

/// Default history window, in blocks, for timeline and registration lookups
pub const DEFAULT_HISTORY_LOOKBACK_BLOCKS: u64 = 1_000_000;

/// Dispute state as stored by the registry contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeStatus {
    #[default]
    Clear,
    Disputed,
}

impl DisputeStatus {
    /// Decode the contract's `uint8` enum value
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Clear),
            1 => Some(Self::Disputed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "CLEAR",
            Self::Disputed => "DISPUTED",
        }
    }
}

/// Snapshot returned by the contract's record state accessor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    pub exists: bool,
    pub content_hash: H256,
    pub content_ref: String,
    pub created_at: u64,
    pub owner: Address,
    pub dispute_status: DisputeStatus,
    pub dispute_reason: String,
    pub dispute_case_id: String,
    pub dispute_at: u64,
    pub transfer_pending: bool,
    pub pending_buyer: Address,
}

/// The five registry events the core reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Registered,
    TransferInitiated,
    TransferFinalized,
    DisputeFlagged,
    DisputeCleared,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Registered,
        EventKind::TransferInitiated,
        EventKind::TransferFinalized,
        EventKind::DisputeFlagged,
        EventKind::DisputeCleared,
    ];

    /// Event name in the contract interface
    pub fn name(&self) -> &'static str {
        match self {
            Self::Registered => "Registered",
            Self::TransferInitiated => "TransferInitiated",
            Self::TransferFinalized => "TransferFinalized",
            Self::DisputeFlagged => "DisputeFlagged",
            Self::DisputeCleared => "DisputeCleared",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed arguments of a registry event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum LedgerEvent {
    Registered {
        owner: Address,
        content_hash: H256,
        content_ref: String,
        timestamp: u64,
    },
    TransferInitiated {
        seller: Address,
        buyer: Address,
        timestamp: u64,
    },
    TransferFinalized {
        previous_owner: Address,
        new_owner: Address,
        timestamp: u64,
    },
    DisputeFlagged {
        reason: String,
        case_id: String,
        timestamp: u64,
    },
    DisputeCleared {
        case_id: String,
        timestamp: u64,
    },
}

impl LedgerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Registered { .. } => EventKind::Registered,
            Self::TransferInitiated { .. } => EventKind::TransferInitiated,
            Self::TransferFinalized { .. } => EventKind::TransferFinalized,
            Self::DisputeFlagged { .. } => EventKind::DisputeFlagged,
            Self::DisputeCleared { .. } => EventKind::DisputeCleared,
        }
    }

    /// Ledger timestamp carried in the event arguments
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Registered { timestamp, .. }
            | Self::TransferInitiated { timestamp, .. }
            | Self::TransferFinalized { timestamp, .. }
            | Self::DisputeFlagged { timestamp, .. }
            | Self::DisputeCleared { timestamp, .. } => *timestamp,
        }
    }
}

/// One event log for a record, positioned in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub block_number: u64,
    pub log_index: u64,
    pub tx_hash: H256,
    #[serde(flatten)]
    pub event: LedgerEvent,
}

impl TimelineEvent {
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// Chain position used for ordering
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }
}

/// Bounded lookback over retained history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub lookback_blocks: u64,
    /// First block that can hold registry events
    pub deployment_block: u64,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self {
            lookback_blocks: DEFAULT_HISTORY_LOOKBACK_BLOCKS,
            deployment_block: 0,
        }
    }
}

impl HistoryWindow {
    /// Inclusive block range ending at `latest`
    pub fn range(&self, latest: u64) -> (u64, u64) {
        (
            latest
                .saturating_sub(self.lookback_blocks)
                .max(self.deployment_block.min(latest)),
            latest,
        )
    }

    /// Inclusive range for the earliest-registration lookup: the whole
    /// registry history, independent of the lookback
    pub fn registration_range(&self, latest: u64) -> (u64, u64) {
        (self.deployment_block.min(latest), latest)
    }
}

/// Read interface to the registry ledger
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Current record state. A record the ledger does not know is returned
    /// with `exists == false`.
    async fn get_record(&self, record_id: &RecordId) -> Result<LedgerRecord>;

    /// Height of the latest block
    async fn latest_block(&self) -> Result<u64>;

    /// Events of one kind for a record within `[from_block, to_block]`
    async fn get_events(
        &self,
        record_id: &RecordId,
        kind: EventKind,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<TimelineEvent>>;

    /// Current record state, failing with `RecordNotFound` if it does not exist
    async fn fetch_existing(&self, record_id: &RecordId) -> Result<LedgerRecord> {
        let record = self.get_record(record_id).await?;
        if !record.exists {
            return Err(CertifyError::RecordNotFound(record_id.to_string()));
        }
        Ok(record)
    }
}

/// Bound a ledger-reading future by a caller-supplied deadline
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(CertifyError::LedgerUnavailable(format!(
            "deadline of {}ms exceeded",
            deadline.as_millis()
        ))),
    }
}
