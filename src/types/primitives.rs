//! Fixed-width ledger values
//!
//! All byte values render as `0x`-prefixed lowercase hex, which is also their
//! serde representation. Parsing accepts either case, with or without `0x`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use super::error::CertifyError;

/// Keccak-256 digest of `data`
pub fn keccak256(data: &[u8]) -> H256 {
    H256(Keccak256::digest(data).into())
}

fn decode_fixed<const N: usize>(s: &str, what: &str) -> Result<[u8; N], CertifyError> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    if digits.len() != N * 2 {
        return Err(CertifyError::MalformedInput(format!(
            "{} must be {} hex characters, got {}",
            what,
            N * 2,
            digits.len()
        )));
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| CertifyError::MalformedInput(format!("{} is not hex: {}", what, e)))?;
    Ok(out)
}

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr, $what:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $len])
            }
        }

        impl FromStr for $name {
            type Err = CertifyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$len>(s.trim(), $what).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_bytes!(
    /// 20-byte ledger account address
    Address,
    20,
    "address"
);

fixed_bytes!(
    /// 32-byte digest (content hashes, tx hashes, payload hashes, topics)
    H256,
    32,
    "32-byte hash"
);

fixed_bytes!(
    /// 65-byte recoverable ECDSA signature, `r || s || v`
    SignatureBytes,
    65,
    "signature"
);

impl Address {
    /// Last 20 bytes of a 32-byte word (ABI / topic encoding)
    pub fn from_word(word: &[u8; 32]) -> Self {
        let mut out = [0u8; 20];
        out.copy_from_slice(&word[12..]);
        Self(out)
    }

    /// EIP-55 mixed-case rendering
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash.0[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

/// Maximum accepted record identifier length in bytes
pub const MAX_RECORD_ID_LEN: usize = 128;

/// Validated registry record identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Validate a caller-supplied identifier. No I/O happens before this passes.
    pub fn parse(raw: &str) -> Result<Self, CertifyError> {
        if raw.is_empty() {
            return Err(CertifyError::MalformedInput("record id is empty".to_string()));
        }
        if raw.len() > MAX_RECORD_ID_LEN {
            return Err(CertifyError::MalformedInput(format!(
                "record id exceeds {} bytes",
                MAX_RECORD_ID_LEN
            )));
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(CertifyError::MalformedInput(
                "record id contains whitespace or control characters".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Topic of the `string indexed recordId` event argument
    pub fn topic(&self) -> H256 {
        keccak256(self.0.as_bytes())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_empty() {
        assert_eq!(
            keccak256(b"").to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_address_parse_any_case() {
        let lower: Address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap();
        let mixed: Address = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".parse().unwrap();
        let bare: Address = "7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap();
        assert_eq!(lower, mixed);
        assert_eq!(lower, bare);
        assert_eq!(lower.to_string(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
    }

    #[test]
    fn test_address_checksum() {
        let addr: Address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap();
        assert_eq!(addr.to_checksum(), "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = "0x1234".parse::<H256>().unwrap_err();
        assert!(matches!(err, CertifyError::MalformedInput(_)));
        assert!("0xzz".repeat(16).parse::<H256>().is_err());
    }

    #[test]
    fn test_serde_hex_representation() {
        let hash = keccak256(b"deed");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
        let back: H256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn test_record_id_validation() {
        assert!(RecordId::parse("PARCEL-2024-0001").is_ok());
        assert!(RecordId::parse("").is_err());
        assert!(RecordId::parse("has space").is_err());
        assert!(RecordId::parse("tab\there").is_err());
        assert!(RecordId::parse(&"x".repeat(MAX_RECORD_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_record_topic_is_keccak_of_utf8() {
        let id = RecordId::parse("PARCEL-7").unwrap();
        assert_eq!(id.topic(), keccak256(b"PARCEL-7"));
    }
}
