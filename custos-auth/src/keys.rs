//! Store key layout of the auth subsystem
//!
//! ```text
//! auth/globalAccountNumber          -> u64 (fixed 8 bytes, little endian)
//! auth/params                       -> Params
//! auth/account:<address bytes>      -> AccountEnvelope
//! auth/accountByNumber:<u64 BE>     -> address bytes
//! ```

use custos_common::prelude::*;

/// Module name, used for logging and key namespacing
pub const MODULE_NAME: &str = "auth";

/// Key of the global account-number counter
pub const GLOBAL_ACCOUNT_NUMBER_KEY: &[u8] = b"auth/globalAccountNumber";

/// Key of the module parameters
pub const PARAMS_KEY: &[u8] = b"auth/params";

/// Prefix of the primary address -> account index
pub const ADDRESS_STORE_PREFIX: &[u8] = b"auth/account:";

/// Prefix of the secondary account number -> address index
pub const ACCOUNT_NUMBER_STORE_PREFIX: &[u8] = b"auth/accountByNumber:";

/// Primary key of the account stored at `address`
pub fn address_store_key(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(ADDRESS_STORE_PREFIX.len() + address.as_ref().len());
    key.extend_from_slice(ADDRESS_STORE_PREFIX);
    key.extend_from_slice(address.as_ref());
    key
}

/// Secondary key of `account_number`; big endian so keys sort numerically
pub fn account_number_store_key(account_number: AccountNumber) -> Vec<u8> {
    let mut key = Vec::with_capacity(ACCOUNT_NUMBER_STORE_PREFIX.len() + 8);
    key.extend_from_slice(ACCOUNT_NUMBER_STORE_PREFIX);
    key.extend_from_slice(&account_number.to_be_bytes());
    key
}

/// Recover the address from a primary key
pub fn address_from_store_key(key: &[u8]) -> CustosResult<Address> {
    let raw = key.strip_prefix(ADDRESS_STORE_PREFIX).ok_or_else(|| {
        CustosError::corruption(format!("key {} is not an account key", hex::encode(key)))
    })?;
    Address::from_slice(raw)
        .map_err(|e| CustosError::corruption(format!("malformed account key: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_key_roundtrip() {
        let addr = Address::new([9u8; 20]);
        let key = address_store_key(&addr);
        assert!(key.starts_with(ADDRESS_STORE_PREFIX));
        assert_eq!(address_from_store_key(&key).unwrap(), addr);
        assert!(address_from_store_key(b"auth/params").is_err());
    }

    #[test]
    fn test_number_keys_sort_numerically() {
        assert!(account_number_store_key(255) < account_number_store_key(256));
        assert!(account_number_store_key(1) < account_number_store_key(u64::MAX));
    }

    #[test]
    fn test_prefixes_are_disjoint() {
        assert!(!ACCOUNT_NUMBER_STORE_PREFIX.starts_with(ADDRESS_STORE_PREFIX));
        assert!(!ADDRESS_STORE_PREFIX.starts_with(ACCOUNT_NUMBER_STORE_PREFIX));
    }
}
