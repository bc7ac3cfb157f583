//! Certificate issuance, verification and timeline tests against the in-memory ledger

use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use registry_certify::certificate::{
    verify_envelope, verify_proof, CertificateFacade, OperatorKey, PayloadConfig,
};
use registry_certify::chain::{
    ChainReader, DisputeStatus, HistoryWindow, InMemoryLedger, LedgerEvent, LedgerRecord,
};
use registry_certify::timeline::{RiskTier, RiskWeights};
use registry_certify::types::{Address, CertifyError, RecordId, VerificationFailure, H256};

const RECORD: &str = "PARCEL-0042";
const CONTENT_CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
const DEADLINE: Duration = Duration::from_secs(2);

fn owner() -> Address {
    Address([0x11; 20])
}

fn buyer() -> Address {
    Address([0x22; 20])
}

fn payload_config() -> PayloadConfig {
    PayloadConfig {
        public_base_url: "https://registry.example".to_string(),
        chain_id: 31337,
        registry_address: Address([0x5f; 20]),
    }
}

fn operator_key() -> OperatorKey {
    OperatorKey::from_hex("0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318")
        .unwrap()
}

fn facade(ledger: &InMemoryLedger) -> CertificateFacade {
    CertificateFacade::new(
        Arc::new(ledger.clone()),
        payload_config(),
        HistoryWindow::default(),
        operator_key(),
        RiskWeights::default(),
    )
}

async fn registered_ledger() -> InMemoryLedger {
    let ledger = InMemoryLedger::new();
    let content_ref = format!("ipfs://{}", CONTENT_CID);
    ledger
        .put_record(
            RECORD,
            LedgerRecord {
                exists: true,
                content_hash: H256([0xaa; 32]),
                content_ref: content_ref.clone(),
                created_at: 1_700_000_000,
                owner: owner(),
                ..Default::default()
            },
        )
        .await;
    ledger
        .push_event(
            RECORD,
            120,
            LedgerEvent::Registered {
                owner: owner(),
                content_hash: H256([0xaa; 32]),
                content_ref,
                timestamp: 1_700_000_000,
            },
        )
        .await;
    ledger
}

#[tokio::test]
async fn test_issue_is_deterministic() {
    let ledger = registered_ledger().await;
    let facade = facade(&ledger);

    let first = assert_ok!(facade.issue_certificate(RECORD, DEADLINE).await);
    let second = assert_ok!(facade.issue_certificate(RECORD, DEADLINE).await);

    assert_eq!(first.proof.payload_json, second.proof.payload_json);
    assert_eq!(first.proof.payload_hash, second.proof.payload_hash);
    assert_eq!(first.payload.content_cid.as_deref(), Some(CONTENT_CID));
    assert_eq!(first.payload.registration.as_ref().map(|r| r.block_number), Some(120));
}

#[tokio::test]
async fn test_issued_certificate_verifies() {
    let ledger = registered_ledger().await;
    let issued = assert_ok!(facade(&ledger).issue_certificate(RECORD, DEADLINE).await);

    let result = verify_envelope(&issued.proof);
    assert!(result.ok, "verification failed: {:?}", result.reason);
    assert_eq!(result.recovered_signer, Some(operator_key().address()));
    assert!(issued.proof.certificate_number.starts_with("RC-"));
    assert_eq!(issued.proof.certificate_number.len(), "RC-XXXX-XXXX-XXXX".len());
}

#[tokio::test]
async fn test_any_character_change_is_hash_mismatch() {
    let ledger = registered_ledger().await;
    let issued = assert_ok!(facade(&ledger).issue_certificate(RECORD, DEADLINE).await);
    let env = &issued.proof;

    let json = &env.payload_json;
    for idx in [0, json.len() / 2, json.len() - 1] {
        let mut tampered: Vec<u8> = json.as_bytes().to_vec();
        tampered[idx] = if tampered[idx] == b'x' { b'y' } else { b'x' };
        let tampered = String::from_utf8(tampered).unwrap();
        let result = verify_proof(&tampered, &env.payload_hash, &env.signature, &env.signer);
        assert_eq!(result.reason, Some(VerificationFailure::HashMismatch));
    }
}

#[tokio::test]
async fn test_reserialized_payload_is_rejected() {
    let ledger = registered_ledger().await;
    let issued = assert_ok!(facade(&ledger).issue_certificate(RECORD, DEADLINE).await);
    let mut env = issued.proof.clone();

    let parsed: serde_json::Value = serde_json::from_str(&env.payload_json).unwrap();
    env.payload_json = serde_json::to_string_pretty(&parsed).unwrap();

    assert_eq!(
        verify_envelope(&env).reason,
        Some(VerificationFailure::HashMismatch)
    );
}

#[tokio::test]
async fn test_substituted_signature_is_invalid() {
    let ledger = registered_ledger().await;
    let issued = assert_ok!(facade(&ledger).issue_certificate(RECORD, DEADLINE).await);

    let other = CertificateFacade::new(
        Arc::new(ledger.clone()),
        payload_config(),
        HistoryWindow::default(),
        OperatorKey::generate(),
        RiskWeights::default(),
    );
    let forged = assert_ok!(other.issue_certificate(RECORD, DEADLINE).await);

    // same payload, someone else's signature, original signer claimed
    let result = verify_proof(
        &issued.proof.payload_json,
        &issued.proof.payload_hash,
        &forged.proof.signature,
        &issued.proof.signer,
    );
    assert!(!result.ok);
    assert_eq!(result.reason, Some(VerificationFailure::SignatureInvalid));
}

#[tokio::test]
async fn test_missing_record_is_not_found_without_event_queries() {
    let ledger = InMemoryLedger::new();
    let id = RecordId::parse("PARCEL-404").unwrap();

    let record = assert_ok!(ledger.get_record(&id).await);
    assert!(!record.exists);

    let err = assert_err!(facade(&ledger).issue_certificate("PARCEL-404", DEADLINE).await);
    assert!(matches!(err, CertifyError::RecordNotFound(_)));
    assert_eq!(err.status_code().as_u16(), 404);
    assert_eq!(ledger.event_queries(), 0);
}

#[tokio::test]
async fn test_malformed_identifier_makes_no_ledger_calls() {
    let ledger = registered_ledger().await;
    let facade = facade(&ledger);
    let too_long = "X".repeat(200);

    for bad in ["", "has space", "tab\tid", too_long.as_str()] {
        let err = assert_err!(facade.issue_certificate(bad, DEADLINE).await);
        assert!(matches!(err, CertifyError::MalformedInput(_)));
        let err = assert_err!(facade.get_timeline(bad, DEADLINE).await);
        assert!(matches!(err, CertifyError::MalformedInput(_)));
    }
    assert_eq!(ledger.record_reads(), 0);
    assert_eq!(ledger.event_queries(), 0);
}

#[tokio::test]
async fn test_deadline_expiry_is_ledger_unavailable() {
    let ledger = registered_ledger().await;
    ledger.set_latency(Duration::from_millis(200));

    let err = assert_err!(
        facade(&ledger)
            .issue_certificate(RECORD, Duration::from_millis(20))
            .await
    );
    assert!(matches!(err, CertifyError::LedgerUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unavailable_ledger_issues_nothing() {
    let ledger = registered_ledger().await;
    ledger.set_unavailable(true);

    let err = assert_err!(facade(&ledger).issue_certificate(RECORD, DEADLINE).await);
    assert_eq!(err.status_code().as_u16(), 503);
}

#[tokio::test]
async fn test_timeline_ordering_and_risk() {
    let ledger = registered_ledger().await;
    // inserted out of chain order
    ledger
        .push_event(
            RECORD,
            400,
            LedgerEvent::DisputeFlagged {
                reason: "competing claim".to_string(),
                case_id: "CASE-17".to_string(),
                timestamp: 1_700_004_000,
            },
        )
        .await;
    ledger
        .push_event(
            RECORD,
            200,
            LedgerEvent::TransferInitiated {
                seller: owner(),
                buyer: buyer(),
                timestamp: 1_700_002_000,
            },
        )
        .await;
    ledger
        .push_event(
            RECORD,
            300,
            LedgerEvent::TransferInitiated {
                seller: owner(),
                buyer: buyer(),
                timestamp: 1_700_003_000,
            },
        )
        .await;

    let report = assert_ok!(facade(&ledger).get_timeline(RECORD, DEADLINE).await);

    let blocks: Vec<u64> = report.events.iter().map(|e| e.block_number).collect();
    assert_eq!(blocks, vec![120, 200, 300, 400]);
    assert_eq!(report.risk_score, 90);
    assert_eq!(report.risk_tier, RiskTier::High);
    assert_eq!(report.risk_factors.len(), 2);
}

#[tokio::test]
async fn test_clean_record_is_low_risk() {
    let ledger = registered_ledger().await;
    let report = assert_ok!(facade(&ledger).get_timeline(RECORD, DEADLINE).await);
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.risk_score, 0);
    assert_eq!(report.risk_tier, RiskTier::Low);
}

#[tokio::test]
async fn test_disputed_record_payload_reflects_state() {
    let ledger = registered_ledger().await;
    ledger
        .put_record(
            RECORD,
            LedgerRecord {
                exists: true,
                owner: owner(),
                dispute_status: DisputeStatus::Disputed,
                dispute_reason: "boundary".to_string(),
                dispute_case_id: "CASE-3".to_string(),
                transfer_pending: true,
                pending_buyer: buyer(),
                ..Default::default()
            },
        )
        .await;

    let issued = assert_ok!(facade(&ledger).issue_certificate(RECORD, DEADLINE).await);
    assert_eq!(issued.payload.dispute.status, DisputeStatus::Disputed);
    assert!(issued.proof.payload_json.contains("\"DISPUTED\""));
    assert!(issued.display.pending_buyer.is_some());
    assert!(verify_envelope(&issued.proof).ok);
}

#[tokio::test]
async fn test_payload_stable_after_head_leaves_lookback_window() {
    let ledger = registered_ledger().await;
    let facade = facade(&ledger);
    let before = assert_ok!(facade.issue_certificate(RECORD, DEADLINE).await);

    ledger.set_latest_block(5_000_000);
    let after = assert_ok!(facade.issue_certificate(RECORD, DEADLINE).await);

    assert_eq!(after.payload.registration.as_ref().map(|r| r.block_number), Some(120));
    assert_eq!(before.proof.payload_json, after.proof.payload_json);
    assert_eq!(before.proof.certificate_id, after.proof.certificate_id);
}

#[tokio::test]
async fn test_all_links_share_the_public_base() {
    let ledger = registered_ledger().await;
    let issued = assert_ok!(facade(&ledger).issue_certificate(RECORD, DEADLINE).await);
    let links = &issued.payload.links;

    assert_eq!(links.record, format!("https://registry.example/records/{}", RECORD));
    assert_eq!(links.verify, format!("https://registry.example/verify/{}", RECORD));
    assert_eq!(
        links.content.as_deref(),
        Some(format!("https://registry.example/ipfs/{}", CONTENT_CID).as_str())
    );
}
