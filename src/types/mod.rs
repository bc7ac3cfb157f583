//! Shared types: errors, fixed-width ledger values and record identifiers

pub mod error;
pub mod primitives;

pub use error::{CertifyError, Result, VerificationFailure};
pub use primitives::{keccak256, Address, RecordId, SignatureBytes, H256};
