//! Certificate signing and verification
//!
//! # Scheme
//!
//! - `payloadHash = keccak256(utf8(payloadJson))`
//! - `signature = secp256k1_sign(operatorKey, payloadHash)`, the hash itself
//!   is the signed message (no second hashing), encoded `r || s || v` with
//!   `v = 27 + recoveryId`
//! - `certificateId = keccak256(payloadHash || signature)`
//!
//! Verification needs only the four public inputs. It never touches the
//! ledger, so any third party can re-check a certificate offline.

use std::fmt;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use super::payload::CertificatePayload;
use crate::types::{keccak256, Address, CertifyError, Result, SignatureBytes, VerificationFailure, H256};

/// Prefix of human-readable certificate numbers
pub const CERTIFICATE_NUMBER_PREFIX: &str = "RC";

/// Offset added to the recovery id in the `v` byte
const RECOVERY_V_OFFSET: u8 = 27;

/// Address of a secp256k1 public key: last 20 bytes of keccak(uncompressed point)
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_word(&hash.0)
}

/// The registry operator's signing key
pub struct OperatorKey {
    signing_key: SigningKey,
    address: Address,
}

impl OperatorKey {
    /// Parse a 32-byte hex private key, with or without `0x`
    pub fn from_hex(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = Zeroizing::new(
            hex::decode(digits)
                .map_err(|_| CertifyError::Config("operator key is not valid hex".to_string()))?,
        );
        if bytes.len() != 32 {
            return Err(CertifyError::Config(format!(
                "operator key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|_| CertifyError::Config("operator key is not a valid secp256k1 scalar".to_string()))?;
        Ok(Self::from_signing_key(signing_key))
    }

    /// Fresh key from the OS random number generator
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = address_of(signing_key.verifying_key());
        Self {
            signing_key,
            address,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Hex export of the private key, for `keygen`
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.signing_key.to_bytes())))
    }

    /// Sign a 32-byte digest directly
    pub fn sign_digest(&self, digest: &H256) -> Result<SignatureBytes> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| CertifyError::Signing(e.to_string()))?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = RECOVERY_V_OFFSET + recovery_id.to_byte();
        Ok(SignatureBytes(out))
    }
}

impl fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorKey")
            .field("address", &self.address)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

/// Recover the signer address of a digest
pub fn recover_signer(digest: &H256, signature: &SignatureBytes) -> Option<Address> {
    let bytes = signature.as_bytes();
    let v = match bytes[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - RECOVERY_V_OFFSET,
        _ => return None,
    };
    let recovery_id = RecoveryId::from_byte(v)?;
    let sig = Signature::from_slice(&bytes[..64]).ok()?;
    VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id)
        .ok()
        .map(|key| address_of(&key))
}

/// `keccak256(payloadHash || signature)`
pub fn certificate_id(payload_hash: &H256, signature: &SignatureBytes) -> H256 {
    let mut buf = Vec::with_capacity(H256::LEN + SignatureBytes::LEN);
    buf.extend_from_slice(payload_hash.as_bytes());
    buf.extend_from_slice(signature.as_bytes());
    keccak256(&buf)
}

/// `RC-XXXX-XXXX-XXXX` from the first 12 hex digits of the certificate id
pub fn certificate_number(certificate_id: &H256) -> String {
    let digits = hex::encode_upper(&certificate_id.0[..6]);
    format!(
        "{}-{}-{}-{}",
        CERTIFICATE_NUMBER_PREFIX,
        &digits[0..4],
        &digits[4..8],
        &digits[8..12]
    )
}

/// Signature material over one payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    pub payload_hash: H256,
    pub signature: SignatureBytes,
    pub signer: Address,
    pub certificate_id: H256,
    pub certificate_number: String,
}

/// A payload's canonical JSON together with its proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub payload_json: String,
    pub proof: Proof,
}

impl SignedPayload {
    pub fn envelope(&self) -> ProofEnvelope {
        ProofEnvelope {
            payload_json: self.payload_json.clone(),
            payload_hash: self.proof.payload_hash.to_hex(),
            signature: self.proof.signature.to_hex(),
            signer: self.proof.signer.to_hex(),
            certificate_id: self.proof.certificate_id.to_hex(),
            certificate_number: self.proof.certificate_number.clone(),
        }
    }
}

/// Proof wire format. Fields are kept as received strings: `payloadJson` is
/// hashed byte-for-byte and hex fields are parsed only during verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofEnvelope {
    pub payload_json: String,
    pub payload_hash: String,
    pub signature: String,
    pub signer: String,
    pub certificate_id: String,
    pub certificate_number: String,
}

/// Outcome of a verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<VerificationFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovered_signer: Option<Address>,
}

impl VerificationResult {
    fn valid(signer: Address) -> Self {
        Self {
            ok: true,
            reason: None,
            recovered_signer: Some(signer),
        }
    }

    fn invalid(reason: VerificationFailure, recovered_signer: Option<Address>) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
            recovered_signer,
        }
    }

    /// Escalate a failed verification into an error
    pub fn into_result(self) -> Result<Address> {
        match (self.ok, self.reason, self.recovered_signer) {
            (true, _, Some(signer)) => Ok(signer),
            (_, Some(reason), _) => Err(CertifyError::Verification(reason)),
            _ => Err(CertifyError::Verification(VerificationFailure::SignatureInvalid)),
        }
    }
}

/// Verify a `(payloadJson, payloadHash, signature, signer)` tuple.
///
/// The hash check runs first so that payload tampering is reported as
/// `HashMismatch` regardless of the signature.
pub fn verify_proof(
    payload_json: &str,
    payload_hash: &str,
    signature: &str,
    signer: &str,
) -> VerificationResult {
    let (Ok(claimed_hash), Ok(signature), Ok(claimed_signer)) = (
        payload_hash.parse::<H256>(),
        signature.parse::<SignatureBytes>(),
        signer.parse::<Address>(),
    ) else {
        return VerificationResult::invalid(VerificationFailure::MalformedInput, None);
    };

    let computed = keccak256(payload_json.as_bytes());
    if computed != claimed_hash {
        debug!(claimed = %claimed_hash, computed = %computed, "Payload hash mismatch");
        return VerificationResult::invalid(VerificationFailure::HashMismatch, None);
    }

    match recover_signer(&claimed_hash, &signature) {
        Some(recovered) if recovered == claimed_signer => VerificationResult::valid(recovered),
        recovered => {
            debug!(claimed = %claimed_signer, recovered = ?recovered, "Signer mismatch");
            VerificationResult::invalid(VerificationFailure::SignatureInvalid, recovered)
        }
    }
}

/// Verify a wire envelope, including its certificate id and number
pub fn verify_envelope(envelope: &ProofEnvelope) -> VerificationResult {
    let result = verify_proof(
        &envelope.payload_json,
        &envelope.payload_hash,
        &envelope.signature,
        &envelope.signer,
    );
    if !result.ok {
        return result;
    }

    // both parsed successfully inside verify_proof
    let (Ok(hash), Ok(signature)) = (
        envelope.payload_hash.parse::<H256>(),
        envelope.signature.parse::<SignatureBytes>(),
    ) else {
        return VerificationResult::invalid(VerificationFailure::MalformedInput, None);
    };
    let expected_id = certificate_id(&hash, &signature);
    let id_matches = envelope
        .certificate_id
        .parse::<H256>()
        .map(|id| id == expected_id)
        .unwrap_or(false);
    if !id_matches || envelope.certificate_number != certificate_number(&expected_id) {
        return VerificationResult::invalid(
            VerificationFailure::CertificateIdMismatch,
            result.recovered_signer,
        );
    }
    result
}

/// Hashes and signs payloads with the operator key
#[derive(Debug)]
pub struct ProofService {
    key: OperatorKey,
}

impl ProofService {
    pub fn new(key: OperatorKey) -> Self {
        Self { key }
    }

    pub fn signer(&self) -> Address {
        self.key.address()
    }

    /// Sign a payload's canonical JSON
    pub fn sign(&self, payload: &CertificatePayload) -> Result<SignedPayload> {
        let payload_json = payload.canonical_json()?;
        let payload_hash = keccak256(payload_json.as_bytes());
        let signature = self.key.sign_digest(&payload_hash)?;
        let certificate_id = certificate_id(&payload_hash, &signature);

        Ok(SignedPayload {
            payload_json,
            proof: Proof {
                payload_hash,
                signature,
                signer: self.key.address(),
                certificate_id,
                certificate_number: certificate_number(&certificate_id),
            },
        })
    }

    pub fn verify(
        &self,
        payload_json: &str,
        payload_hash: &str,
        signature: &str,
        signer: &str,
    ) -> VerificationResult {
        verify_proof(payload_json, payload_hash, signature, signer)
    }
}
