//! Registry contract interface and ABI word codec
//!
//! The contract interface definition is loaded once at startup and checked
//! against the shapes this crate decodes. An incomplete or mismatching
//! definition is a configuration error; there is no built-in fallback.
//!
//! The codec covers only the ABI types the registry uses: `bool`, `uint8`,
//! `uint256` (values must fit `u64`), `address`, `bytes32` and `string`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use super::{DisputeStatus, EventKind, LedgerEvent, LedgerRecord};
use crate::types::{keccak256, Address, CertifyError, Result, H256};

const WORD: usize = 32;

/// Name of the record state accessor
pub const RECORD_ACCESSOR: &str = "getRecord";

/// Output layout of `getRecord(string)`
pub const RECORD_OUTPUTS: [AbiType; 11] = [
    AbiType::Bool,
    AbiType::Bytes32,
    AbiType::String,
    AbiType::Uint256,
    AbiType::Address,
    AbiType::Uint8,
    AbiType::String,
    AbiType::String,
    AbiType::Uint256,
    AbiType::Bool,
    AbiType::Address,
];

/// Write functions the interface must expose (issued by the workflow layer)
pub const WRITE_FUNCTIONS: [&str; 5] = [
    "registerRecord",
    "initiateTransfer",
    "finalizeTransfer",
    "flagDispute",
    "clearDispute",
];

/// Expected `(type, indexed)` inputs per event. The first input is always the
/// `string indexed recordId`.
fn expected_event_inputs(kind: EventKind) -> &'static [(AbiType, bool)] {
    match kind {
        EventKind::Registered => &[
            (AbiType::String, true),
            (AbiType::Address, true),
            (AbiType::Bytes32, false),
            (AbiType::String, false),
            (AbiType::Uint256, false),
        ],
        EventKind::TransferInitiated | EventKind::TransferFinalized => &[
            (AbiType::String, true),
            (AbiType::Address, true),
            (AbiType::Address, true),
            (AbiType::Uint256, false),
        ],
        EventKind::DisputeFlagged => &[
            (AbiType::String, true),
            (AbiType::String, false),
            (AbiType::String, false),
            (AbiType::Uint256, false),
        ],
        EventKind::DisputeCleared => &[
            (AbiType::String, true),
            (AbiType::String, false),
            (AbiType::Uint256, false),
        ],
    }
}

/// Errors from ABI decoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("data truncated: need {needed} bytes, have {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("invalid {ty} value at word {index}")]
    InvalidValue { ty: &'static str, index: usize },

    #[error("integer does not fit in 64 bits at word {0}")]
    Overflow(usize),

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("expected {expected} topics, got {actual}")]
    TopicCount { expected: usize, actual: usize },

    #[error("unexpected value layout for {0}")]
    Layout(&'static str),
}

impl From<AbiError> for CertifyError {
    fn from(err: AbiError) -> Self {
        CertifyError::LedgerUnavailable(format!("undecodable ledger response: {}", err))
    }
}

/// ABI types used by the registry contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    Bool,
    Uint8,
    Uint256,
    Address,
    Bytes32,
    String,
}

impl AbiType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bool" => Some(Self::Bool),
            "uint8" => Some(Self::Uint8),
            "uint256" | "uint" => Some(Self::Uint256),
            "address" => Some(Self::Address),
            "bytes32" => Some(Self::Bytes32),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    /// Canonical name used in selectors and topics
    pub fn canonical(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Uint8 => "uint8",
            Self::Uint256 => "uint256",
            Self::Address => "address",
            Self::Bytes32 => "bytes32",
            Self::String => "string",
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::String)
    }
}

/// Decoded ABI value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Bool(bool),
    Uint(u64),
    Address(Address),
    Bytes32(H256),
    String(String),
}

fn word_at(data: &[u8], index: usize) -> std::result::Result<&[u8; WORD], AbiError> {
    let start = index.saturating_mul(WORD);
    let end = start.saturating_add(WORD);
    data.get(start..end)
        .and_then(|w| w.try_into().ok())
        .ok_or(AbiError::Truncated {
            needed: end,
            actual: data.len(),
        })
}

fn word_to_u64(word: &[u8; WORD], index: usize) -> std::result::Result<u64, AbiError> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow(index));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(tail))
}

fn decode_static(ty: AbiType, word: &[u8; WORD], index: usize) -> std::result::Result<AbiValue, AbiError> {
    match ty {
        AbiType::Bool => {
            if word[..31].iter().any(|b| *b != 0) || word[31] > 1 {
                return Err(AbiError::InvalidValue { ty: "bool", index });
            }
            Ok(AbiValue::Bool(word[31] == 1))
        }
        AbiType::Uint8 => {
            if word[..31].iter().any(|b| *b != 0) {
                return Err(AbiError::InvalidValue { ty: "uint8", index });
            }
            Ok(AbiValue::Uint(word[31] as u64))
        }
        AbiType::Uint256 => word_to_u64(word, index).map(AbiValue::Uint),
        AbiType::Address => {
            if word[..12].iter().any(|b| *b != 0) {
                return Err(AbiError::InvalidValue { ty: "address", index });
            }
            Ok(AbiValue::Address(Address::from_word(word)))
        }
        AbiType::Bytes32 => Ok(AbiValue::Bytes32(H256(*word))),
        AbiType::String => Err(AbiError::Layout("dynamic type in static position")),
    }
}

/// Decode a head/tail encoded parameter list
pub fn decode_params(types: &[AbiType], data: &[u8]) -> std::result::Result<Vec<AbiValue>, AbiError> {
    let mut values = Vec::with_capacity(types.len());
    for (index, ty) in types.iter().enumerate() {
        let head = word_at(data, index)?;
        if !ty.is_dynamic() {
            values.push(decode_static(*ty, head, index)?);
            continue;
        }

        let offset = word_to_u64(head, index)? as usize;
        if offset % WORD != 0 {
            return Err(AbiError::InvalidValue { ty: "offset", index });
        }
        let len_word = word_at(data, offset / WORD)?;
        let len = word_to_u64(len_word, offset / WORD)? as usize;
        let start = offset.saturating_add(WORD);
        let bytes = start
            .checked_add(len)
            .and_then(|end| data.get(start..end))
            .ok_or(AbiError::Truncated {
                needed: start.saturating_add(len),
                actual: data.len(),
            })?;
        let s = std::str::from_utf8(bytes).map_err(|_| AbiError::InvalidUtf8)?;
        values.push(AbiValue::String(s.to_string()));
    }
    Ok(values)
}

fn u64_word(v: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[24..].copy_from_slice(&v.to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Head/tail encode a parameter list
pub fn encode_params(values: &[AbiValue]) -> Vec<u8> {
    let head_len = values.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for value in values {
        match value {
            AbiValue::Bool(b) => head.extend_from_slice(&u64_word(*b as u64)),
            AbiValue::Uint(v) => head.extend_from_slice(&u64_word(*v)),
            AbiValue::Address(a) => {
                let mut word = [0u8; WORD];
                word[12..].copy_from_slice(a.as_bytes());
                head.extend_from_slice(&word);
            }
            AbiValue::Bytes32(h) => head.extend_from_slice(h.as_bytes()),
            AbiValue::String(s) => {
                head.extend_from_slice(&u64_word((head_len + tail.len()) as u64));
                tail.extend_from_slice(&u64_word(s.len() as u64));
                let mut bytes = s.as_bytes().to_vec();
                bytes.resize(padded_len(s.len()), 0);
                tail.extend_from_slice(&bytes);
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// First four bytes of the keccak of a canonical function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash.0[..4]);
    out
}

fn canonical_signature(name: &str, types: &[AbiType]) -> String {
    let args: Vec<&str> = types.iter().map(|t| t.canonical()).collect();
    format!("{}({})", name, args.join(","))
}

// ============================================================================
// Interface definition (JSON)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AbiDocument {
    Artifact { abi: Vec<AbiEntry> },
    Bare(Vec<AbiEntry>),
}

#[derive(Debug, Deserialize)]
struct AbiEntry {
    #[serde(rename = "type")]
    entry_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<AbiParam>,
    #[serde(default)]
    outputs: Vec<AbiParam>,
}

#[derive(Debug, Deserialize)]
struct AbiParam {
    #[serde(rename = "type")]
    param_type: String,
    #[serde(default)]
    indexed: bool,
}

/// Decoding layout for one event
#[derive(Debug, Clone)]
pub struct EventSpec {
    pub kind: EventKind,
    pub topic0: H256,
    pub inputs: Vec<(AbiType, bool)>,
}

impl EventSpec {
    fn new(kind: EventKind, inputs: Vec<(AbiType, bool)>) -> Self {
        let types: Vec<AbiType> = inputs.iter().map(|(t, _)| *t).collect();
        let topic0 = keccak256(canonical_signature(kind.name(), &types).as_bytes());
        Self { kind, topic0, inputs }
    }

    /// Decode a log's topics and data into positional values. Indexed
    /// strings only exist as their hash, so they decode to `Bytes32`.
    pub fn decode(&self, topics: &[H256], data: &[u8]) -> std::result::Result<Vec<AbiValue>, AbiError> {
        let indexed = self.inputs.iter().filter(|(_, i)| *i).count();
        if topics.len() != indexed + 1 {
            return Err(AbiError::TopicCount {
                expected: indexed + 1,
                actual: topics.len(),
            });
        }

        let data_types: Vec<AbiType> =
            self.inputs.iter().filter(|(_, i)| !*i).map(|(t, _)| *t).collect();
        let mut data_values = decode_params(&data_types, data)?.into_iter();
        let mut topic_values = topics[1..].iter();

        let mut values = Vec::with_capacity(self.inputs.len());
        for (position, (ty, is_indexed)) in self.inputs.iter().enumerate() {
            let value = if *is_indexed {
                let topic = topic_values.next().ok_or(AbiError::Layout("missing topic"))?;
                match ty {
                    AbiType::String => AbiValue::Bytes32(*topic),
                    other => decode_static(*other, topic.as_bytes(), position)?,
                }
            } else {
                data_values.next().ok_or(AbiError::Layout("missing data value"))?
            };
            values.push(value);
        }
        Ok(values)
    }
}

/// Validated registry contract interface
#[derive(Debug, Clone)]
pub struct ContractInterface {
    record_selector: [u8; 4],
    events: HashMap<EventKind, EventSpec>,
}

impl ContractInterface {
    /// Load and validate an interface definition from a file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CertifyError::Config(format!(
                "cannot read contract interface {}: {}",
                path.display(),
                e
            ))
        })?;
        let interface = Self::from_json(&raw)?;
        info!(path = %path.display(), "Contract interface loaded");
        Ok(interface)
    }

    /// Parse a bare ABI array or an artifact object with an `abi` field
    pub fn from_json(raw: &str) -> Result<Self> {
        let document: AbiDocument = serde_json::from_str(raw)
            .map_err(|e| CertifyError::Config(format!("invalid contract interface JSON: {}", e)))?;
        let entries = match document {
            AbiDocument::Artifact { abi } => abi,
            AbiDocument::Bare(entries) => entries,
        };

        let find = |entry_type: &str, name: &str| {
            entries
                .iter()
                .find(|e| e.entry_type == entry_type && e.name == name)
        };
        let types_of = |params: &[AbiParam], context: &str| -> Result<Vec<(AbiType, bool)>> {
            params
                .iter()
                .map(|p| {
                    AbiType::parse(&p.param_type)
                        .map(|t| (t, p.indexed))
                        .ok_or_else(|| {
                            CertifyError::Config(format!(
                                "{} uses unsupported type {}",
                                context, p.param_type
                            ))
                        })
                })
                .collect()
        };

        let accessor = find("function", RECORD_ACCESSOR).ok_or_else(|| {
            CertifyError::Config(format!("contract interface lacks {}", RECORD_ACCESSOR))
        })?;
        let inputs = types_of(&accessor.inputs, RECORD_ACCESSOR)?;
        if inputs.iter().map(|(t, _)| *t).collect::<Vec<_>>() != [AbiType::String] {
            return Err(CertifyError::Config(format!(
                "{} must take a single string argument",
                RECORD_ACCESSOR
            )));
        }
        let outputs: Vec<AbiType> = types_of(&accessor.outputs, RECORD_ACCESSOR)?
            .into_iter()
            .map(|(t, _)| t)
            .collect();
        if outputs != RECORD_OUTPUTS {
            return Err(CertifyError::Config(format!(
                "{} must return the 11-field record tuple",
                RECORD_ACCESSOR
            )));
        }

        for name in WRITE_FUNCTIONS {
            if find("function", name).is_none() {
                return Err(CertifyError::Config(format!(
                    "contract interface lacks function {}",
                    name
                )));
            }
        }

        let mut events = HashMap::new();
        for kind in EventKind::ALL {
            let entry = find("event", kind.name()).ok_or_else(|| {
                CertifyError::Config(format!("contract interface lacks event {}", kind))
            })?;
            let inputs = types_of(&entry.inputs, kind.name())?;
            if inputs != expected_event_inputs(kind) {
                return Err(CertifyError::Config(format!(
                    "event {} has an unexpected argument layout",
                    kind
                )));
            }
            let layout = EventSpec::new(kind, inputs);
            debug!(event = %kind, topic0 = %layout.topic0, "Event layout registered");
            events.insert(kind, layout);
        }

        Ok(Self {
            record_selector: selector(&canonical_signature(RECORD_ACCESSOR, &[AbiType::String])),
            events,
        })
    }

    /// Calldata for `getRecord(recordId)`
    pub fn encode_record_call(&self, record_id: &str) -> Vec<u8> {
        let mut data = self.record_selector.to_vec();
        data.extend(encode_params(&[AbiValue::String(record_id.to_string())]));
        data
    }

    /// Decode the return data of `getRecord`
    pub fn decode_record(&self, data: &[u8]) -> std::result::Result<LedgerRecord, AbiError> {
        let values = decode_params(&RECORD_OUTPUTS, data)?;
        record_from_values(values)
    }

    pub fn event(&self, kind: EventKind) -> &EventSpec {
        // every kind is inserted by from_json
        &self.events[&kind]
    }

    /// Decode a log of the given kind into its typed arguments
    pub fn decode_event(
        &self,
        kind: EventKind,
        topics: &[H256],
        data: &[u8],
    ) -> std::result::Result<LedgerEvent, AbiError> {
        let values = self.event(kind).decode(topics, data)?;
        event_from_values(kind, values)
    }
}

fn record_from_values(values: Vec<AbiValue>) -> std::result::Result<LedgerRecord, AbiError> {
    use AbiValue as V;
    match <[AbiValue; 11]>::try_from(values) {
        Ok([
            V::Bool(exists),
            V::Bytes32(content_hash),
            V::String(content_ref),
            V::Uint(created_at),
            V::Address(owner),
            V::Uint(status),
            V::String(dispute_reason),
            V::String(dispute_case_id),
            V::Uint(dispute_at),
            V::Bool(transfer_pending),
            V::Address(pending_buyer),
        ]) => Ok(LedgerRecord {
            exists,
            content_hash,
            content_ref,
            created_at,
            owner,
            dispute_status: DisputeStatus::from_code(status)
                .ok_or(AbiError::InvalidValue { ty: "dispute status", index: 5 })?,
            dispute_reason,
            dispute_case_id,
            dispute_at,
            transfer_pending,
            pending_buyer,
        }),
        _ => Err(AbiError::Layout("record tuple")),
    }
}

fn event_from_values(kind: EventKind, values: Vec<AbiValue>) -> std::result::Result<LedgerEvent, AbiError> {
    use AbiValue as V;
    let event = match (kind, values.as_slice()) {
        (
            EventKind::Registered,
            [V::Bytes32(_), V::Address(owner), V::Bytes32(content_hash), V::String(content_ref), V::Uint(timestamp)],
        ) => LedgerEvent::Registered {
            owner: *owner,
            content_hash: *content_hash,
            content_ref: content_ref.clone(),
            timestamp: *timestamp,
        },
        (
            EventKind::TransferInitiated,
            [V::Bytes32(_), V::Address(seller), V::Address(buyer), V::Uint(timestamp)],
        ) => LedgerEvent::TransferInitiated {
            seller: *seller,
            buyer: *buyer,
            timestamp: *timestamp,
        },
        (
            EventKind::TransferFinalized,
            [V::Bytes32(_), V::Address(previous_owner), V::Address(new_owner), V::Uint(timestamp)],
        ) => LedgerEvent::TransferFinalized {
            previous_owner: *previous_owner,
            new_owner: *new_owner,
            timestamp: *timestamp,
        },
        (
            EventKind::DisputeFlagged,
            [V::Bytes32(_), V::String(reason), V::String(case_id), V::Uint(timestamp)],
        ) => LedgerEvent::DisputeFlagged {
            reason: reason.clone(),
            case_id: case_id.clone(),
            timestamp: *timestamp,
        },
        (EventKind::DisputeCleared, [V::Bytes32(_), V::String(case_id), V::Uint(timestamp)]) => {
            LedgerEvent::DisputeCleared {
                case_id: case_id.clone(),
                timestamp: *timestamp,
            }
        }
        _ => return Err(AbiError::Layout("event arguments")),
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_REGISTRY_ABI: &str = include_str!("../../abi/PropertyRegistry.json");

    fn interface() -> ContractInterface {
        ContractInterface::from_json(TEST_REGISTRY_ABI).unwrap()
    }

    #[test]
    fn test_known_selector() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
    }

    #[test]
    fn test_record_call_encoding() {
        let iface = interface();
        let data = iface.encode_record_call("PARCEL-1");
        assert_eq!(&data[..4], &selector("getRecord(string)"));
        // offset, length, one padded word
        assert_eq!(data.len(), 4 + 3 * WORD);
        assert_eq!(data[4 + WORD - 1], 0x20);
        assert_eq!(data[4 + 2 * WORD - 1], 8);
        assert_eq!(&data[4 + 2 * WORD..4 + 2 * WORD + 8], b"PARCEL-1");
    }

    #[test]
    fn test_decode_record_tuple() {
        let owner = Address([0x11; 20]);
        let buyer = Address([0x22; 20]);
        let encoded = encode_params(&[
            AbiValue::Bool(true),
            AbiValue::Bytes32(H256([0xab; 32])),
            AbiValue::String("ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG".into()),
            AbiValue::Uint(1_700_000_000),
            AbiValue::Address(owner),
            AbiValue::Uint(1),
            AbiValue::String("boundary claim".into()),
            AbiValue::String("CASE-42".into()),
            AbiValue::Uint(1_700_000_500),
            AbiValue::Bool(true),
            AbiValue::Address(buyer),
        ]);

        let record = interface().decode_record(&encoded).unwrap();
        assert!(record.exists);
        assert_eq!(record.owner, owner);
        assert_eq!(record.dispute_status, DisputeStatus::Disputed);
        assert_eq!(record.dispute_case_id, "CASE-42");
        assert_eq!(record.pending_buyer, buyer);
        assert_eq!(record.created_at, 1_700_000_000);
    }

    #[test]
    fn test_decode_rejects_truncated_and_dirty_words() {
        let iface = interface();
        assert!(matches!(
            iface.decode_record(&[0u8; 64]),
            Err(AbiError::Truncated { .. })
        ));

        let mut bool_word = [0u8; WORD];
        bool_word[31] = 2;
        assert!(decode_params(&[AbiType::Bool], &bool_word).is_err());

        let mut big = [0u8; WORD];
        big[0] = 1;
        assert_eq!(
            decode_params(&[AbiType::Uint256], &big),
            Err(AbiError::Overflow(0))
        );
    }

    #[test]
    fn test_decode_dispute_flagged_log() {
        let iface = interface();
        let layout = iface.event(EventKind::DisputeFlagged);
        let record_topic = keccak256(b"PARCEL-1");
        let data = encode_params(&[
            AbiValue::String("forged deed".into()),
            AbiValue::String("CASE-7".into()),
            AbiValue::Uint(1_700_000_123),
        ]);

        let event = iface
            .decode_event(EventKind::DisputeFlagged, &[layout.topic0, record_topic], &data)
            .unwrap();
        assert_eq!(
            event,
            LedgerEvent::DisputeFlagged {
                reason: "forged deed".into(),
                case_id: "CASE-7".into(),
                timestamp: 1_700_000_123,
            }
        );
    }

    #[test]
    fn test_decode_indexed_addresses_from_topics() {
        let iface = interface();
        let layout = iface.event(EventKind::TransferInitiated);
        let mut seller = [0u8; WORD];
        seller[12..].copy_from_slice(&[0x33; 20]);
        let mut buyer = [0u8; WORD];
        buyer[12..].copy_from_slice(&[0x44; 20]);
        let data = encode_params(&[AbiValue::Uint(99)]);

        let event = iface
            .decode_event(
                EventKind::TransferInitiated,
                &[layout.topic0, keccak256(b"PARCEL-1"), H256(seller), H256(buyer)],
                &data,
            )
            .unwrap();
        assert_eq!(
            event,
            LedgerEvent::TransferInitiated {
                seller: Address([0x33; 20]),
                buyer: Address([0x44; 20]),
                timestamp: 99,
            }
        );
    }

    #[test]
    fn test_wrong_topic_count_rejected() {
        let iface = interface();
        let layout = iface.event(EventKind::DisputeCleared);
        let data = encode_params(&[AbiValue::String("C".into()), AbiValue::Uint(1)]);
        assert!(matches!(
            iface.decode_event(EventKind::DisputeCleared, &[layout.topic0], &data),
            Err(AbiError::TopicCount { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_artifact_wrapper_accepted() {
        let wrapped = format!("{{\"contractName\":\"PropertyRegistry\",\"abi\":{}}}", TEST_REGISTRY_ABI);
        assert!(ContractInterface::from_json(&wrapped).is_ok());
    }

    #[test]
    fn test_incomplete_interface_fails_loudly() {
        let mut entries: Vec<serde_json::Value> = serde_json::from_str(TEST_REGISTRY_ABI).unwrap();
        entries.retain(|e| e["name"] != "DisputeCleared");
        let err = ContractInterface::from_json(&serde_json::to_string(&entries).unwrap()).unwrap_err();
        assert!(matches!(err, CertifyError::Config(msg) if msg.contains("DisputeCleared")));

        assert!(matches!(
            ContractInterface::from_json("[]"),
            Err(CertifyError::Config(_))
        ));
        assert!(matches!(
            ContractInterface::from_json("not json"),
            Err(CertifyError::Config(_))
        ));
    }

    #[test]
    fn test_event_layout_mismatch_rejected() {
        let mut entries: Vec<serde_json::Value> = serde_json::from_str(TEST_REGISTRY_ABI).unwrap();
        for entry in entries.iter_mut() {
            if entry["name"] == "TransferInitiated" {
                entry["inputs"][1]["indexed"] = serde_json::Value::Bool(false);
            }
        }
        let err = ContractInterface::from_json(&serde_json::to_string(&entries).unwrap()).unwrap_err();
        assert!(matches!(err, CertifyError::Config(msg) if msg.contains("TransferInitiated")));
    }
}
