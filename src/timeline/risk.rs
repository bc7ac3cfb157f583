//! Heuristic risk scoring over a record's timeline

use serde::{Deserialize, Serialize};

use crate::chain::{EventKind, TimelineEvent};

/// Any dispute ever flagged
pub const DISPUTE_FLAGGED_WEIGHT: u32 = 70;
/// More than one transfer initiation
pub const REPEATED_TRANSFER_INITIATED_WEIGHT: u32 = 20;
/// More than one finalized transfer
pub const REPEATED_TRANSFER_FINALIZED_WEIGHT: u32 = 20;
/// More than one registration of the same record id.
/// The registry rejects duplicate ids, so this mostly fires on replayed or
/// forked history; kept as a signal anyway.
pub const DUPLICATE_REGISTRATION_WEIGHT: u32 = 30;

pub const MAX_RISK_SCORE: u8 = 100;
pub const HIGH_RISK_THRESHOLD: u8 = 70;
pub const MEDIUM_RISK_THRESHOLD: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_score(score: u8) -> Self {
        if score >= HIGH_RISK_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

/// Points added per heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskWeights {
    pub dispute_flagged: u32,
    pub repeated_transfer_initiated: u32,
    pub repeated_transfer_finalized: u32,
    pub duplicate_registration: u32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            dispute_flagged: DISPUTE_FLAGGED_WEIGHT,
            repeated_transfer_initiated: REPEATED_TRANSFER_INITIATED_WEIGHT,
            repeated_transfer_finalized: REPEATED_TRANSFER_FINALIZED_WEIGHT,
            duplicate_registration: DUPLICATE_REGISTRATION_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub score: u8,
    pub tier: RiskTier,
    /// Heuristics that contributed, in evaluation order
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    weights: RiskWeights,
}

impl RiskScorer {
    pub fn new(weights: RiskWeights) -> Self {
        Self { weights }
    }

    /// Score a timeline. Total, deterministic and order-independent.
    pub fn score(&self, events: &[TimelineEvent]) -> RiskAssessment {
        let count = |kind: EventKind| events.iter().filter(|e| e.kind() == kind).count();

        let rules = [
            (
                count(EventKind::DisputeFlagged) > 0,
                self.weights.dispute_flagged,
                "dispute flagged",
            ),
            (
                count(EventKind::TransferInitiated) > 1,
                self.weights.repeated_transfer_initiated,
                "repeated transfer initiations",
            ),
            (
                count(EventKind::TransferFinalized) > 1,
                self.weights.repeated_transfer_finalized,
                "repeated finalized transfers",
            ),
            (
                count(EventKind::Registered) > 1,
                self.weights.duplicate_registration,
                "duplicate registration",
            ),
        ];

        let mut total: u32 = 0;
        let mut factors = Vec::new();
        for (fired, weight, label) in rules {
            if fired {
                total = total.saturating_add(weight);
                factors.push(format!("{} (+{})", label, weight));
            }
        }

        let score = total.min(u32::from(MAX_RISK_SCORE)) as u8;
        RiskAssessment {
            score,
            tier: RiskTier::from_score(score),
            factors,
        }
    }
}
