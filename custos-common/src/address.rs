//! Human-readable address encoding

use crate::{
    error::{CustosError, CustosResult},
    types::Address,
};
use bech32::{FromBase32, ToBase32, Variant};

/// Converts between canonical binary addresses and their text form.
pub trait AddressCodec: Send + Sync {
    /// Encode raw address bytes as text
    fn bytes_to_string(&self, bytes: &[u8]) -> CustosResult<String>;

    /// Decode text into raw address bytes
    fn string_to_bytes(&self, text: &str) -> CustosResult<Vec<u8>>;

    /// Encode a typed address
    fn encode(&self, address: &Address) -> CustosResult<String> {
        self.bytes_to_string(address.as_bytes())
    }

    /// Decode text into a typed address
    fn decode(&self, text: &str) -> CustosResult<Address> {
        Address::from_slice(&self.string_to_bytes(text)?)
    }
}

/// Bech32 codec bound to a single human-readable prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bech32Codec {
    prefix: String,
}

impl Bech32Codec {
    /// Create a codec for `prefix`, e.g. `"cosmos"`
    pub fn new(prefix: impl Into<String>) -> CustosResult<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() || prefix.len() > 83 {
            return Err(CustosError::config(format!(
                "bech32 prefix must be 1..=83 characters, got {}",
                prefix.len()
            )));
        }
        if !prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(CustosError::config(format!(
                "bech32 prefix {prefix:?} must be lowercase ascii alphanumeric"
            )));
        }
        Ok(Self { prefix })
    }

    /// The configured human-readable prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl AddressCodec for Bech32Codec {
    fn bytes_to_string(&self, bytes: &[u8]) -> CustosResult<String> {
        // Only canonical 20-byte addresses have a text form.
        Address::from_slice(bytes)?;
        bech32::encode(&self.prefix, bytes.to_base32(), Variant::Bech32)
            .map_err(|e| CustosError::invalid_address(e.to_string()))
    }

    fn string_to_bytes(&self, text: &str) -> CustosResult<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(CustosError::invalid_address(
                "empty address string is not allowed",
            ));
        }

        let (hrp, data, variant) =
            bech32::decode(text).map_err(|e| CustosError::invalid_address(e.to_string()))?;

        if variant != Variant::Bech32 {
            return Err(CustosError::invalid_address(format!(
                "{text}: expected bech32, found bech32m"
            )));
        }
        if hrp != self.prefix {
            return Err(CustosError::invalid_address(format!(
                "invalid Bech32 prefix; expected {}, got {}",
                self.prefix, hrp
            )));
        }

        let bytes =
            Vec::<u8>::from_base32(&data).map_err(|e| CustosError::invalid_address(e.to_string()))?;
        Address::from_slice(&bytes)?;
        Ok(bytes)
    }
}
