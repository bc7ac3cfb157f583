//! Certificate payload construction
//!
//! A payload is the canonical snapshot that gets hashed and signed. It is a
//! pure function of the record id, the ledger snapshot, the earliest
//! registration event and static configuration. Nothing observed from the
//! request (wall clock, host headers) may enter it, so two builds against an
//! unchanged ledger serialize to identical bytes.
//!
//! Every link (record, verify, content) is derived from the one configured
//! public base URL, so the registry's own `/ipfs/<cid>` route serves content.
//!
//! The registration section comes from the earliest `Registered` event at or
//! after the registry's deployment block, not from the rolling history
//! window, so an untouched record keeps the same payload as the head advances.
//!
//! Field order in the JSON is the struct declaration order below. Adding,
//! removing or reordering fields changes every payload hash: bump
//! [`PAYLOAD_SCHEMA`] when doing so.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::content_ref::extract_cid;
use super::mask::mask;
use crate::chain::{ChainReader, DisputeStatus, EventKind, HistoryWindow, LedgerRecord, TimelineEvent};
use crate::types::{Address, RecordId, Result, H256};

/// Schema tag embedded in every payload
pub const PAYLOAD_SCHEMA: &str = "registry-certificate/v1";

/// Static inputs to payload construction
#[derive(Debug, Clone)]
pub struct PayloadConfig {
    /// Externally reachable base URL of the registry (no trailing slash needed)
    pub public_base_url: String,
    /// Ledger chain id
    pub chain_id: u64,
    /// Registry contract address
    pub registry_address: Address,
}

impl PayloadConfig {
    fn base(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeSection {
    pub status: DisputeStatus,
    pub reason: String,
    pub case_id: String,
    pub flagged_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSection {
    pub pending: bool,
    pub pending_buyer: Address,
}

/// Metadata of the earliest `Registered` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSection {
    pub block_number: u64,
    pub tx_hash: H256,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSection {
    pub record: String,
    pub verify: String,
    pub content: Option<String>,
}

/// Canonical certificate payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePayload {
    pub schema: String,
    pub record_id: String,
    pub chain_id: u64,
    pub registry: Address,
    pub owner: Address,
    pub content_hash: H256,
    pub content_ref: String,
    pub content_cid: Option<String>,
    pub created_at: u64,
    pub created_at_iso: String,
    pub dispute: DisputeSection,
    pub transfer: TransferSection,
    pub registration: Option<RegistrationSection>,
    pub links: LinkSection,
}

/// Masked display strings; never part of the canonical JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFields {
    pub owner: String,
    pub content_hash: String,
    pub pending_buyer: Option<String>,
    pub registration_tx: Option<String>,
}

fn iso8601(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

impl CertificatePayload {
    /// Assemble a payload. Pure: identical inputs give identical payloads.
    pub fn assemble(
        record_id: &RecordId,
        record: &LedgerRecord,
        registration: Option<&TimelineEvent>,
        config: &PayloadConfig,
    ) -> Self {
        let content_cid = extract_cid(&record.content_ref);
        let encoded_id = urlencoding::encode(record_id.as_str());

        let links = LinkSection {
            record: format!("{}/records/{}", config.base(), encoded_id),
            verify: format!("{}/verify/{}", config.base(), encoded_id),
            content: content_cid
                .as_ref()
                .map(|cid| format!("{}/ipfs/{}", config.base(), cid)),
        };

        Self {
            schema: PAYLOAD_SCHEMA.to_string(),
            record_id: record_id.as_str().to_string(),
            chain_id: config.chain_id,
            registry: config.registry_address,
            owner: record.owner,
            content_hash: record.content_hash,
            content_ref: record.content_ref.clone(),
            content_cid,
            created_at: record.created_at,
            created_at_iso: iso8601(record.created_at),
            dispute: DisputeSection {
                status: record.dispute_status,
                reason: record.dispute_reason.clone(),
                case_id: record.dispute_case_id.clone(),
                flagged_at: record.dispute_at,
            },
            transfer: TransferSection {
                pending: record.transfer_pending,
                pending_buyer: record.pending_buyer,
            },
            registration: registration.map(|e| RegistrationSection {
                block_number: e.block_number,
                tx_hash: e.tx_hash,
                timestamp: e.event.timestamp(),
            }),
            links,
        }
    }

    /// Canonical JSON: the exact bytes that are hashed and signed
    pub fn canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Masked presentation strings derived from the full values
    pub fn display(&self) -> DisplayFields {
        DisplayFields {
            owner: mask(&self.owner.to_checksum()),
            content_hash: mask(&self.content_hash.to_hex()),
            pending_buyer: self
                .transfer
                .pending
                .then(|| mask(&self.transfer.pending_buyer.to_checksum())),
            registration_tx: self
                .registration
                .as_ref()
                .map(|r| mask(&r.tx_hash.to_hex())),
        }
    }
}

/// Builds payloads from live ledger state
pub struct PayloadBuilder {
    chain: Arc<dyn ChainReader>,
    config: PayloadConfig,
    window: HistoryWindow,
}

impl PayloadBuilder {
    pub fn new(chain: Arc<dyn ChainReader>, config: PayloadConfig, window: HistoryWindow) -> Self {
        Self {
            chain,
            config,
            window,
        }
    }

    /// Build the payload for a record from the ledger's current state
    pub async fn build(&self, record_id: &RecordId) -> Result<CertificatePayload> {
        let record = self.chain.fetch_existing(record_id).await?;

        let latest = self.chain.latest_block().await?;
        let (from, to) = self.window.registration_range(latest);
        let registrations = self
            .chain
            .get_events(record_id, EventKind::Registered, from, to)
            .await?;
        let registration = registrations.iter().min_by_key(|e| e.position());

        if registration.is_none() {
            debug!(record_id = %record_id, from, to, "No registration event since registry deployment");
        }

        Ok(CertificatePayload::assemble(
            record_id,
            &record,
            registration,
            &self.config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::LedgerEvent;

    const V0: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    fn config() -> PayloadConfig {
        PayloadConfig {
            public_base_url: "https://registry.example/".to_string(),
            chain_id: 31337,
            registry_address: Address([0x5f; 20]),
        }
    }

    fn record() -> LedgerRecord {
        LedgerRecord {
            exists: true,
            content_hash: H256([0xaa; 32]),
            content_ref: format!("ipfs://{}", V0),
            created_at: 1_700_000_000,
            owner: Address([0x11; 20]),
            ..Default::default()
        }
    }

    fn registration() -> TimelineEvent {
        TimelineEvent {
            block_number: 120,
            log_index: 0,
            tx_hash: H256([0xbb; 32]),
            event: LedgerEvent::Registered {
                owner: Address([0x11; 20]),
                content_hash: H256([0xaa; 32]),
                content_ref: format!("ipfs://{}", V0),
                timestamp: 1_700_000_000,
            },
        }
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let id = RecordId::parse("PARCEL-1").unwrap();
        let reg = registration();
        let a = CertificatePayload::assemble(&id, &record(), Some(&reg), &config());
        let b = CertificatePayload::assemble(&id, &record(), Some(&reg), &config());
        assert_eq!(a.canonical_json().unwrap(), b.canonical_json().unwrap());
    }

    #[test]
    fn test_links_from_configured_base() {
        let id = RecordId::parse("LOT_7/B").unwrap();
        let payload = CertificatePayload::assemble(&id, &record(), None, &config());
        assert_eq!(payload.links.record, "https://registry.example/records/LOT_7%2FB");
        assert_eq!(payload.links.verify, "https://registry.example/verify/LOT_7%2FB");
        assert_eq!(
            payload.links.content.as_deref(),
            Some(format!("https://registry.example/ipfs/{}", V0).as_str())
        );
    }

    #[test]
    fn test_key_order_is_stable() {
        let id = RecordId::parse("PARCEL-1").unwrap();
        let json = CertificatePayload::assemble(&id, &record(), None, &config())
            .canonical_json()
            .unwrap();
        let schema = json.find("\"schema\"").unwrap();
        let record_id = json.find("\"recordId\"").unwrap();
        let links = json.find("\"links\"").unwrap();
        assert!(schema < record_id && record_id < links);
        assert!(json.contains("\"registration\":null"));
        assert!(json.contains("\"createdAtIso\":\"2023-11-14T22:13:20Z\""));
    }

    #[test]
    fn test_masks_stay_out_of_canonical_json() {
        let id = RecordId::parse("PARCEL-1").unwrap();
        let reg = registration();
        let payload = CertificatePayload::assemble(&id, &record(), Some(&reg), &config());
        let json = payload.canonical_json().unwrap();
        let display = payload.display();

        assert!(display.owner.contains('…'));
        assert!(!json.contains('…'));
        assert!(json.contains(&payload.owner.to_hex()));
        assert!(display.pending_buyer.is_none());
        assert!(display.registration_tx.is_some());
    }

    #[test]
    fn test_canonical_json_parses_back() {
        let id = RecordId::parse("PARCEL-1").unwrap();
        let payload = CertificatePayload::assemble(&id, &record(), None, &config());
        let back: CertificatePayload =
            serde_json::from_str(&payload.canonical_json().unwrap()).unwrap();
        assert_eq!(back, payload);
    }
}
