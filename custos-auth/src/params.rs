//! Auth module parameters

use custos_common::prelude::*;
use serde::{Deserialize, Serialize};

/// Default maximum memo length
pub const DEFAULT_MAX_MEMO_CHARACTERS: u64 = 256;
/// Default maximum number of signatures per transaction
pub const DEFAULT_TX_SIG_LIMIT: u64 = 7;
/// Default gas charged per transaction byte
pub const DEFAULT_TX_SIZE_COST_PER_BYTE: u64 = 10;
/// Default gas charged per ed25519 signature check
pub const DEFAULT_SIG_VERIFY_COST_ED25519: u64 = 590;
/// Default gas charged per secp256k1 signature check
pub const DEFAULT_SIG_VERIFY_COST_SECP256K1: u64 = 1000;

/// Parameters consumed by transaction processing on top of the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Maximum memo length in characters
    pub max_memo_characters: u64,
    /// Maximum signatures per transaction
    pub tx_sig_limit: u64,
    /// Gas per transaction byte
    pub tx_size_cost_per_byte: u64,
    /// Gas per ed25519 signature verification
    pub sig_verify_cost_ed25519: u64,
    /// Gas per secp256k1 signature verification
    pub sig_verify_cost_secp256k1: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_memo_characters: DEFAULT_MAX_MEMO_CHARACTERS,
            tx_sig_limit: DEFAULT_TX_SIG_LIMIT,
            tx_size_cost_per_byte: DEFAULT_TX_SIZE_COST_PER_BYTE,
            sig_verify_cost_ed25519: DEFAULT_SIG_VERIFY_COST_ED25519,
            sig_verify_cost_secp256k1: DEFAULT_SIG_VERIFY_COST_SECP256K1,
        }
    }
}

impl Params {
    /// Every parameter must be positive
    pub fn validate(&self) -> CustosResult<()> {
        ValidationUtils::validate_nonzero(self.max_memo_characters, "max memo characters")?;
        ValidationUtils::validate_nonzero(self.tx_sig_limit, "tx signature limit")?;
        ValidationUtils::validate_nonzero(self.tx_size_cost_per_byte, "tx size cost per byte")?;
        ValidationUtils::validate_nonzero(self.sig_verify_cost_ed25519, "ed25519 sig verify cost")?;
        ValidationUtils::validate_nonzero(
            self.sig_verify_cost_secp256k1,
            "secp256k1 sig verify cost",
        )
    }
}

impl CustosSerialize for Params {
    fn preferred_encoding() -> EncodingType {
        EncodingType::Bincode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn test_zero_rejected() {
        let params = Params {
            tx_sig_limit: 0,
            ..Params::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("tx signature limit"));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let params: Params = serde_json::from_str(r#"{"tx_sig_limit": 3}"#).unwrap();
        assert_eq!(params.tx_sig_limit, 3);
        assert_eq!(params.max_memo_characters, DEFAULT_MAX_MEMO_CHARACTERS);
    }
}
