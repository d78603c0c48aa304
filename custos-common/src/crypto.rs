//! Cryptographic utilities and address derivation

use crate::types::{sizes::ADDRESS_SIZE, Address, Hash};
use sha2::{Digest, Sha256};

/// Central cryptographic utilities
pub struct CryptoUtils;

impl CryptoUtils {
    /// Compute SHA-256 hash of data
    pub fn hash(data: &[u8]) -> Hash {
        Sha256::digest(data).into()
    }

    /// Derive an account address: the first 20 bytes of SHA-256(data)
    pub fn address_hash(data: &[u8]) -> Address {
        let digest = Self::hash(data);
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(&digest[..ADDRESS_SIZE]);
        Address::new(bytes)
    }

    /// Deterministic address of a module account.
    ///
    /// Persisted module accounts live at this address, so changing the
    /// derivation is a state migration.
    pub fn module_address(module_name: &str) -> Address {
        Self::address_hash(module_name.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_address_is_deterministic() {
        let a = CryptoUtils::module_address("fee_collector");
        let b = CryptoUtils::module_address("fee_collector");
        assert_eq!(a, b);
        assert_ne!(a, CryptoUtils::module_address("bonded_pool"));
    }

    #[test]
    fn test_module_address_is_truncated_sha256() {
        let digest = CryptoUtils::hash(b"fee_collector");
        let addr = CryptoUtils::module_address("fee_collector");
        assert_eq!(addr.as_bytes()[..], digest[..20]);
    }
}
