//! Certificate issuance and verification
//!
//! ## Pieces
//!
//! - **payload**: deterministic canonical payload from a ledger snapshot
//! - **proof**: keccak hashing, secp256k1 signing and offline verification
//! - **content_ref**: CID extraction from content references
//! - **mask**: truncated display forms
//! - **facade**: the entry points outer surfaces call

pub mod content_ref;
pub mod facade;
pub mod mask;
pub mod payload;
pub mod proof;

pub use content_ref::extract_cid;
pub use facade::{CertificateFacade, IssuedCertificate, TimelineReport};
pub use mask::mask;
pub use payload::{CertificatePayload, DisplayFields, PayloadBuilder, PayloadConfig, PAYLOAD_SCHEMA};
pub use proof::{
    certificate_id, certificate_number, recover_signer, verify_envelope, verify_proof, OperatorKey,
    Proof, ProofEnvelope, ProofService, SignedPayload, VerificationResult,
};
