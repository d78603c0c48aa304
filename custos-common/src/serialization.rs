//! Standard data serialization patterns for Custos
//!
//! Consensus-critical records use a fixed, deterministic bincode
//! configuration; human-facing documents (genesis, query output) use JSON.

use crate::error::{CustosError, CustosResult};
use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

/// Upper bound on any single encoded record
pub const MAX_ENCODED_SIZE: u64 = 4 * 1024 * 1024;

/// Standard encoding types used throughout Custos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingType {
    /// Deterministic binary encoding for state persistence
    Bincode,
    /// Human-readable format for genesis, configuration and queries
    Json,
}

/// The bincode configuration every stored value is written with.
///
/// Fixed-width integers, little endian, trailing bytes rejected so that a
/// value has exactly one accepted encoding.
pub fn binary_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_ENCODED_SIZE)
        .reject_trailing_bytes()
}

/// Trait for standardized serialization across all Custos types
pub trait CustosSerialize: Serialize + DeserializeOwned {
    /// Get the preferred encoding type for this data structure
    fn preferred_encoding() -> EncodingType;

    /// Serialize using the preferred encoding
    fn encode(&self) -> CustosResult<Vec<u8>> {
        self.encode_as(Self::preferred_encoding())
    }

    /// Serialize using a specific encoding
    fn encode_as(&self, encoding: EncodingType) -> CustosResult<Vec<u8>> {
        match encoding {
            EncodingType::Bincode => binary_options()
                .serialize(self)
                .map_err(|e| CustosError::encode(e.to_string())),
            EncodingType::Json => {
                serde_json::to_vec(self).map_err(|e| CustosError::encode(e.to_string()))
            }
        }
    }

    /// Deserialize using the preferred encoding
    fn decode(bytes: &[u8]) -> CustosResult<Self> {
        Self::decode_as(bytes, Self::preferred_encoding())
    }

    /// Deserialize using a specific encoding
    fn decode_as(bytes: &[u8], encoding: EncodingType) -> CustosResult<Self> {
        match encoding {
            EncodingType::Bincode => binary_options()
                .deserialize(bytes)
                .map_err(|e| CustosError::decode(e.to_string())),
            EncodingType::Json => {
                serde_json::from_slice(bytes).map_err(|e| CustosError::decode(e.to_string()))
            }
        }
    }
}

// Global counters are stored as fixed 8-byte little endian values.
impl CustosSerialize for u64 {
    fn preferred_encoding() -> EncodingType {
        EncodingType::Bincode
    }
}
