//! Entry points used by outer surfaces (CLI, HTTP handlers)
//!
//! The facade holds no mutable state. Identifiers are validated before any
//! ledger call, and every ledger-reading call is bounded by the caller's
//! deadline.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::payload::{CertificatePayload, DisplayFields, PayloadBuilder, PayloadConfig};
use super::proof::{verify_envelope, OperatorKey, ProofEnvelope, ProofService, VerificationResult};
use crate::chain::{with_deadline, ChainReader, HistoryWindow, LedgerRecord, TimelineEvent};
use crate::timeline::{RiskScorer, RiskTier, RiskWeights, TimelineAggregator};
use crate::types::{Address, CertifyError, RecordId, Result};

/// A freshly issued certificate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCertificate {
    pub payload: CertificatePayload,
    pub display: DisplayFields,
    pub proof: ProofEnvelope,
}

/// Ordered events of a record with their risk assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineReport {
    pub record_id: String,
    pub events: Vec<TimelineEvent>,
    pub risk_score: u8,
    pub risk_tier: RiskTier,
    pub risk_factors: Vec<String>,
}

pub struct CertificateFacade {
    chain: Arc<dyn ChainReader>,
    builder: PayloadBuilder,
    proofs: Option<ProofService>,
    aggregator: TimelineAggregator,
    scorer: RiskScorer,
}

impl CertificateFacade {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        config: PayloadConfig,
        window: HistoryWindow,
        operator_key: OperatorKey,
        weights: RiskWeights,
    ) -> Self {
        let mut facade = Self::read_only(chain, config, window, weights);
        facade.proofs = Some(ProofService::new(operator_key));
        facade
    }

    /// A facade without an operator key: it serves timelines, records and
    /// verification but refuses to issue
    pub fn read_only(
        chain: Arc<dyn ChainReader>,
        config: PayloadConfig,
        window: HistoryWindow,
        weights: RiskWeights,
    ) -> Self {
        Self {
            builder: PayloadBuilder::new(chain.clone(), config, window),
            aggregator: TimelineAggregator::new(chain.clone(), window),
            chain,
            proofs: None,
            scorer: RiskScorer::new(weights),
        }
    }

    pub fn signer(&self) -> Option<Address> {
        self.proofs.as_ref().map(ProofService::signer)
    }

    /// Build and sign a certificate for the record's current ledger state
    pub async fn issue_certificate(&self, record_id: &str, deadline: Duration) -> Result<IssuedCertificate> {
        let record_id = RecordId::parse(record_id)?;
        let proofs = self
            .proofs
            .as_ref()
            .ok_or_else(|| CertifyError::Signing("no operator key configured".to_string()))?;
        let payload = with_deadline(deadline, self.builder.build(&record_id)).await?;
        let signed = proofs.sign(&payload)?;

        info!(
            record_id = %record_id,
            certificate = %signed.proof.certificate_number,
            payload_hash = %signed.proof.payload_hash,
            "Certificate issued"
        );

        Ok(IssuedCertificate {
            display: payload.display(),
            payload,
            proof: signed.envelope(),
        })
    }

    /// Verify a proof envelope. Offline; never fails.
    pub fn verify_certificate(&self, envelope: &ProofEnvelope) -> VerificationResult {
        let result = verify_envelope(envelope);
        if let Some(reason) = &result.reason {
            warn!(certificate = %envelope.certificate_number, reason = %reason, "Certificate verification failed");
        }
        result
    }

    /// Ordered timeline and risk assessment for a record
    pub async fn get_timeline(&self, record_id: &str, deadline: Duration) -> Result<TimelineReport> {
        let record_id = RecordId::parse(record_id)?;
        let events = with_deadline(deadline, self.aggregator.timeline(&record_id)).await?;
        let assessment = self.scorer.score(&events);

        info!(
            record_id = %record_id,
            events = events.len(),
            risk_score = assessment.score,
            risk_tier = assessment.tier.as_str(),
            "Timeline served"
        );

        Ok(TimelineReport {
            record_id: record_id.to_string(),
            events,
            risk_score: assessment.score,
            risk_tier: assessment.tier,
            risk_factors: assessment.factors,
        })
    }

    /// Raw ledger snapshot; an unknown record comes back with `exists == false`
    pub async fn get_record(&self, record_id: &str, deadline: Duration) -> Result<LedgerRecord> {
        let record_id = RecordId::parse(record_id)?;
        with_deadline(deadline, self.chain.get_record(&record_id)).await
    }
}
