//! Registry Certify - signed certificates for registry ledger records
//!
//! Issues tamper-evident certificates for records held on a ledger registry
//! and serves each record's event timeline with a heuristic risk score.
//!
//! ## Components
//!
//! - **Chain**: typed reads of record state and event logs over JSON-RPC
//! - **Certificate**: deterministic payloads, secp256k1 proofs, offline verification
//! - **Timeline**: ordered event history and risk scoring
//! - **Config / Logging**: clap arguments and tracing setup for the binary

pub mod certificate;
pub mod chain;
pub mod config;
pub mod logging;
pub mod timeline;
pub mod types;

pub use certificate::{CertificateFacade, IssuedCertificate, ProofEnvelope, TimelineReport, VerificationResult};
pub use chain::{ChainReader, InMemoryLedger, RpcChainReader};
pub use config::Args;
pub use types::{CertifyError, Result};
