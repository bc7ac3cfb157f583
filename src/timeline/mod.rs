//! Record event timeline
//!
//! Gathers every registry event for a record over the retained history
//! window and orders it by chain position. The ledger reader's own ordering
//! is never trusted.

pub mod risk;

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::chain::{ChainReader, EventKind, HistoryWindow, TimelineEvent};
use crate::types::{RecordId, Result};

pub use risk::{RiskAssessment, RiskScorer, RiskTier, RiskWeights};

/// Merges the per-kind event queries into one ordered timeline
pub struct TimelineAggregator {
    chain: Arc<dyn ChainReader>,
    window: HistoryWindow,
}

impl TimelineAggregator {
    pub fn new(chain: Arc<dyn ChainReader>, window: HistoryWindow) -> Self {
        Self { chain, window }
    }

    /// All events for `record_id`, ascending by `(block_number, log_index)`
    pub async fn timeline(&self, record_id: &RecordId) -> Result<Vec<TimelineEvent>> {
        let latest = self.chain.latest_block().await?;
        let (from, to) = self.window.range(latest);

        let queries = EventKind::ALL
            .iter()
            .map(|kind| self.chain.get_events(record_id, *kind, from, to));
        let mut events: Vec<TimelineEvent> = try_join_all(queries).await?.into_iter().flatten().collect();

        events.sort_by_key(|e| e.position());
        debug!(record_id = %record_id, from, to, count = events.len(), "Timeline assembled");
        Ok(events)
    }
}
