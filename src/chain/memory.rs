//! In-memory ledger
//!
//! A [`ChainReader`] backed by plain maps, for tests and local demos. Events
//! are returned in insertion order, not chain order, so callers cannot rely
//! on the reader for ordering.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ChainReader, EventKind, LedgerEvent, LedgerRecord, TimelineEvent};
use crate::types::{keccak256, CertifyError, RecordId, Result};

#[derive(Default)]
struct LedgerState {
    records: HashMap<String, LedgerRecord>,
    events: Vec<(String, TimelineEvent)>,
}

/// In-memory registry ledger
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
    head: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
    latency_ms: Arc<AtomicU64>,
    record_reads: Arc<AtomicUsize>,
    event_queries: Arc<AtomicUsize>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace a record snapshot
    pub async fn put_record(&self, record_id: &str, record: LedgerRecord) {
        self.state
            .write()
            .await
            .records
            .insert(record_id.to_string(), record);
    }

    /// Append an event log. The head advances to cover its block.
    pub async fn push_event(&self, record_id: &str, block_number: u64, event: LedgerEvent) -> TimelineEvent {
        let mut state = self.state.write().await;
        let log_index = state
            .events
            .iter()
            .filter(|(_, e)| e.block_number == block_number)
            .count() as u64;
        let tx_hash = keccak256(
            format!("{}:{}:{}", record_id, block_number, log_index).as_bytes(),
        );
        let timeline_event = TimelineEvent {
            block_number,
            log_index,
            tx_hash,
            event,
        };
        state
            .events
            .push((record_id.to_string(), timeline_event.clone()));
        self.head.fetch_max(block_number, Ordering::SeqCst);
        timeline_event
    }

    pub fn set_latest_block(&self, block: u64) {
        self.head.store(block, Ordering::SeqCst);
    }

    /// Make every call fail with `LedgerUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every call, to exercise caller deadlines
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of `get_record` calls served
    pub fn record_reads(&self) -> usize {
        self.record_reads.load(Ordering::SeqCst)
    }

    /// Number of `get_events` calls served
    pub fn event_queries(&self) -> usize {
        self.event_queries.load(Ordering::SeqCst)
    }

    async fn gate(&self) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CertifyError::LedgerUnavailable(
                "in-memory ledger marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainReader for InMemoryLedger {
    async fn get_record(&self, record_id: &RecordId) -> Result<LedgerRecord> {
        self.record_reads.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        Ok(self
            .state
            .read()
            .await
            .records
            .get(record_id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn latest_block(&self) -> Result<u64> {
        self.gate().await?;
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn get_events(
        &self,
        record_id: &RecordId,
        kind: EventKind,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<TimelineEvent>> {
        self.event_queries.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        Ok(self
            .state
            .read()
            .await
            .events
            .iter()
            .filter(|(id, e)| {
                id == record_id.as_str()
                    && e.kind() == kind
                    && e.block_number >= from_block
                    && e.block_number <= to_block
            })
            .map(|(_, e)| e.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    #[tokio::test]
    async fn test_unknown_record_reads_as_not_existing() {
        let ledger = InMemoryLedger::new();
        let id = RecordId::parse("PARCEL-404").unwrap();
        let record = ledger.get_record(&id).await.unwrap();
        assert!(!record.exists);
        assert!(matches!(
            ledger.fetch_existing(&id).await,
            Err(CertifyError::RecordNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_events_filtered_by_record_kind_and_range() {
        let ledger = InMemoryLedger::new();
        let owner = Address([1u8; 20]);
        for (id, block) in [("A", 10), ("B", 11), ("A", 20), ("A", 30)] {
            ledger
                .push_event(
                    id,
                    block,
                    LedgerEvent::TransferInitiated {
                        seller: owner,
                        buyer: owner,
                        timestamp: block,
                    },
                )
                .await;
        }

        let id = RecordId::parse("A").unwrap();
        let events = ledger
            .get_events(&id, EventKind::TransferInitiated, 15, 30)
            .await
            .unwrap();
        let blocks: Vec<u64> = events.iter().map(|e| e.block_number).collect();
        assert_eq!(blocks, vec![20, 30]);
        assert_eq!(ledger.latest_block().await.unwrap(), 30);
        assert_eq!(ledger.event_queries(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_ledger_fails() {
        let ledger = InMemoryLedger::new();
        ledger.set_unavailable(true);
        let id = RecordId::parse("A").unwrap();
        assert!(ledger.get_record(&id).await.unwrap_err().is_retryable());
    }
}
