//custos-common/src/types.rs
//! Common type definitions and constants used throughout Custos

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Globally unique, monotonically issued account identifier
pub type AccountNumber = u64;

/// Per-account replay-protection counter
pub type Sequence = u64;

/// Hash type - 32-byte SHA-256
pub type Hash = [u8; 32];

/// Cryptographic sizes
pub mod sizes {
    /// Hash size in bytes (SHA-256)
    pub const HASH_SIZE: usize = 32;

    /// Account address size in bytes
    pub const ADDRESS_SIZE: usize = 20;

    /// Ed25519 public key size in bytes
    pub const ED25519_PUBKEY_SIZE: usize = 32;

    /// Compressed secp256k1 public key size in bytes
    pub const SECP256K1_PUBKEY_SIZE: usize = 33;
}

/// Canonical binary account address.
///
/// Serializes as a hex string in human-readable formats (JSON genesis,
/// configuration) and as raw bytes in binary formats (stored records).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; sizes::ADDRESS_SIZE]);

impl Address {
    /// Wrap raw address bytes
    pub const fn new(bytes: [u8; sizes::ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build an address from a slice, rejecting any length other than 20 bytes
    pub fn from_slice(bytes: &[u8]) -> crate::error::CustosResult<Self> {
        let array: [u8; sizes::ADDRESS_SIZE] = bytes.try_into().map_err(|_| {
            crate::error::CustosError::invalid_address(format!(
                "expected {} bytes, got {}",
                sizes::ADDRESS_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; sizes::ADDRESS_SIZE] {
        &self.0
    }

    /// Owned copy of the address bytes
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// True for the all-zero address
    pub fn is_empty(&self) -> bool {
        self.0.is_zero()
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; sizes::ADDRESS_SIZE]> for Address {
    fn from(bytes: [u8; sizes::ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "address({})", hex::encode_upper(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex_bytes::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = hex_bytes::deserialize(deserializer)?;
        Address::from_slice(&bytes).map_err(de::Error::custom)
    }
}

/// Serde helper for byte strings: hex in human-readable formats, raw bytes otherwise.
pub mod hex_bytes {
    use serde::{de, Deserializer, Serializer};
    use std::fmt;

    /// Serialize bytes as hex or raw depending on the format
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    /// Deserialize bytes written by [`serialize`]
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(HexVisitor)
        } else {
            deserializer.deserialize_byte_buf(BytesVisitor)
        }
    }

    struct HexVisitor;

    impl<'de> de::Visitor<'de> for HexVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a hex encoded byte string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            hex::decode(v).map_err(E::custom)
        }
    }

    struct BytesVisitor;

    impl<'de> de::Visitor<'de> for BytesVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a byte string")
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
            Ok(v.to_vec())
        }

        fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(byte) = seq.next_element::<u8>()? {
                out.push(byte);
            }
            Ok(out)
        }
    }
}

/// Utility functions for common operations using extension traits
macro_rules! impl_byte_array_ext {
    ($name:ident, $len:expr) => {
        /// Helpers for fixed-size byte arrays
        pub trait $name {
            /// Create an array filled with zeros
            fn zero() -> Self;
            /// Check if every byte in the array is zero
            fn is_zero(&self) -> bool;
        }

        impl $name for [u8; $len] {
            fn zero() -> Self {
                [0u8; $len]
            }

            fn is_zero(&self) -> bool {
                self.iter().all(|&b| b == 0)
            }
        }
    };
}

impl_byte_array_ext!(AddressExt, 20);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_from_slice_rejects_bad_length() {
        assert!(Address::from_slice(&[1u8; 20]).is_ok());
        assert!(Address::from_slice(&[1u8; 19]).is_err());
        assert!(Address::from_slice(&[]).is_err());
    }

    #[test]
    fn test_address_serde_formats() {
        let addr = Address::new([0xab; 20]);

        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(20)));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), addr);

        let bin = bincode::serialize(&addr).unwrap();
        // u64 length prefix followed by the raw bytes
        assert_eq!(bin.len(), 8 + 20);
        assert_eq!(bincode::deserialize::<Address>(&bin).unwrap(), addr);
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::default().is_empty());
        assert!(!Address::new([1; 20]).is_empty());
    }
}
