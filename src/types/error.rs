//! Error types for the certificate core
//!
//! Pattern adapted from doorway's `types/error.rs`.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Why a presented proof did not verify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum VerificationFailure {
    /// Digest of `payloadJson` differs from the supplied `payloadHash`
    #[error("payload hash mismatch")]
    HashMismatch,

    /// Signature does not recover to the claimed signer
    #[error("signature invalid for claimed signer")]
    SignatureInvalid,

    /// A hex field could not be parsed
    #[error("malformed proof input")]
    MalformedInput,

    /// Certificate id or number is not derived from hash and signature
    #[error("certificate id does not match hash and signature")]
    CertificateIdMismatch,
}

/// Main error type for certificate and timeline operations
#[derive(Debug, thiserror::Error)]
pub enum CertifyError {
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Verification failed: {0}")]
    Verification(VerificationFailure),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CertifyError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RecordNotFound(_) => StatusCode::NOT_FOUND,
            Self::LedgerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::MalformedInput(_) => StatusCode::BAD_REQUEST,
            Self::Verification(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LedgerUnavailable(_))
    }
}

impl From<reqwest::Error> for CertifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::LedgerUnavailable(format!("RPC timed out: {}", err))
        } else {
            Self::LedgerUnavailable(format!("RPC transport: {}", err))
        }
    }
}

impl From<serde_json::Error> for CertifyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for CertifyError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type alias for certificate operations
pub type Result<T> = std::result::Result<T, CertifyError>;
