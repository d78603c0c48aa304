//! Account variants and their accessor traits

use custos_common::prelude::*;
use custos_common::types::{hex_bytes, sizes};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission to mint new tokens
pub const MINTER: &str = "minter";

/// Permission to burn tokens held by the module
pub const BURNER: &str = "burner";

/// Permission to take part in staking (bond/unbond) flows
pub const STAKING: &str = "staking";

/// Public key attached to an account once it has signed
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PubKey {
    /// 32-byte Ed25519 key
    #[serde(rename = "ed25519")]
    Ed25519(#[serde(with = "hex_bytes")] Vec<u8>),
    /// 33-byte compressed secp256k1 key
    #[serde(rename = "secp256k1")]
    Secp256k1(#[serde(with = "hex_bytes")] Vec<u8>),
}

impl PubKey {
    /// Ed25519 key, length checked
    pub fn ed25519(bytes: impl Into<Vec<u8>>) -> CustosResult<Self> {
        let key = Self::Ed25519(bytes.into());
        key.validate()?;
        Ok(key)
    }

    /// Compressed secp256k1 key, length checked
    pub fn secp256k1(bytes: impl Into<Vec<u8>>) -> CustosResult<Self> {
        let key = Self::Secp256k1(bytes.into());
        key.validate()?;
        Ok(key)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Ed25519(bytes) | Self::Secp256k1(bytes) => bytes,
        }
    }

    /// Address controlled by this key
    pub fn address(&self) -> Address {
        CryptoUtils::address_hash(self.as_bytes())
    }

    /// Check the key length for its algorithm
    pub fn validate(&self) -> CustosResult<()> {
        match self {
            Self::Ed25519(bytes) => ValidationUtils::validate_bytes_length(
                bytes,
                sizes::ED25519_PUBKEY_SIZE,
                "ed25519 public key",
            ),
            Self::Secp256k1(bytes) => ValidationUtils::validate_bytes_length(
                bytes,
                sizes::SECP256K1_PUBKEY_SIZE,
                "secp256k1 public key",
            ),
        }
    }
}

impl fmt::Debug for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519(bytes) => write!(f, "PubKeyEd25519{{{}}}", hex::encode_upper(bytes)),
            Self::Secp256k1(bytes) => write!(f, "PubKeySecp256k1{{{}}}", hex::encode_upper(bytes)),
        }
    }
}

/// Accessors every account variant provides.
///
/// An account presumes a notion of sequence numbers for replay protection,
/// account numbers for replay protection of previously pruned accounts,
/// and a public key for authentication.
pub trait AccountI: fmt::Display {
    /// The account's address
    fn address(&self) -> &Address;
    /// Replace the address
    fn set_address(&mut self, address: Address) -> CustosResult<()>;

    /// The public key, absent until the account has signed
    fn pub_key(&self) -> Option<&PubKey>;
    /// Attach the public key
    fn set_pub_key(&mut self, pub_key: PubKey) -> CustosResult<()>;

    /// The account number
    fn account_number(&self) -> AccountNumber;
    /// Replace the account number
    fn set_account_number(&mut self, account_number: AccountNumber) -> CustosResult<()>;

    /// The sequence (used for replay protection)
    fn sequence(&self) -> Sequence;
    /// Replace the sequence
    fn set_sequence(&mut self, sequence: Sequence) -> CustosResult<()>;

    /// Stateless consistency checks
    fn validate(&self) -> CustosResult<()>;
}

/// Accessors of system-owned accounts
pub trait ModuleAccountI: AccountI {
    /// Module name the account belongs to
    fn name(&self) -> &str;
    /// Permissions claimed by the account
    fn permissions(&self) -> &[String];
    /// Whether `permission` is claimed by the account
    fn has_permission(&self, permission: &str) -> bool {
        self.permissions().iter().any(|p| p == permission)
    }
}

/// Plain externally owned account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAccount {
    /// Address of the account
    pub address: Address,
    /// Public key, populated on first signature
    pub pub_key: Option<PubKey>,
    /// Globally unique account number
    pub account_number: AccountNumber,
    /// Replay-protection sequence
    pub sequence: Sequence,
}

impl BaseAccount {
    /// Unnumbered account at `address`
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }
}

impl CustosSerialize for BaseAccount {
    fn preferred_encoding() -> EncodingType {
        EncodingType::Bincode
    }
}

impl AccountI for BaseAccount {
    fn address(&self) -> &Address {
        &self.address
    }

    fn set_address(&mut self, address: Address) -> CustosResult<()> {
        self.address = address;
        Ok(())
    }

    fn pub_key(&self) -> Option<&PubKey> {
        self.pub_key.as_ref()
    }

    fn set_pub_key(&mut self, pub_key: PubKey) -> CustosResult<()> {
        pub_key.validate()?;
        self.pub_key = Some(pub_key);
        Ok(())
    }

    fn account_number(&self) -> AccountNumber {
        self.account_number
    }

    fn set_account_number(&mut self, account_number: AccountNumber) -> CustosResult<()> {
        self.account_number = account_number;
        Ok(())
    }

    fn sequence(&self) -> Sequence {
        self.sequence
    }

    fn set_sequence(&mut self, sequence: Sequence) -> CustosResult<()> {
        self.sequence = sequence;
        Ok(())
    }

    fn validate(&self) -> CustosResult<()> {
        if let Some(pub_key) = &self.pub_key {
            pub_key.validate()?;
            if pub_key.address() != self.address {
                return Err(CustosError::validation(format!(
                    "account address {} and public key address {} do not match",
                    self.address,
                    pub_key.address()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for BaseAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BaseAccount{{address: {}, account_number: {}, sequence: {}}}",
            self.address, self.account_number, self.sequence
        )
    }
}

/// System-owned account living at the address derived from its module name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAccount {
    /// Embedded base account
    pub base_account: BaseAccount,
    /// Module name
    pub name: String,
    /// Claimed permissions, in declaration order
    pub permissions: Vec<String>,
}

impl ModuleAccount {
    /// Unnumbered module account at the module's derived address
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        permissions: impl IntoIterator<Item = S>,
    ) -> Self {
        let name = name.into();
        Self {
            base_account: BaseAccount::new(CryptoUtils::module_address(&name)),
            name,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

impl CustosSerialize for ModuleAccount {
    fn preferred_encoding() -> EncodingType {
        EncodingType::Bincode
    }
}

impl AccountI for ModuleAccount {
    fn address(&self) -> &Address {
        &self.base_account.address
    }

    fn set_address(&mut self, address: Address) -> CustosResult<()> {
        let expected = CryptoUtils::module_address(&self.name);
        if address != expected {
            return Err(CustosError::validation(format!(
                "module account {} must live at {}, not {}",
                self.name, expected, address
            )));
        }
        self.base_account.address = address;
        Ok(())
    }

    fn pub_key(&self) -> Option<&PubKey> {
        self.base_account.pub_key.as_ref()
    }

    fn set_pub_key(&mut self, _pub_key: PubKey) -> CustosResult<()> {
        Err(CustosError::validation(format!(
            "module account {} cannot have a public key",
            self.name
        )))
    }

    fn account_number(&self) -> AccountNumber {
        self.base_account.account_number
    }

    fn set_account_number(&mut self, account_number: AccountNumber) -> CustosResult<()> {
        self.base_account.set_account_number(account_number)
    }

    fn sequence(&self) -> Sequence {
        self.base_account.sequence
    }

    fn set_sequence(&mut self, sequence: Sequence) -> CustosResult<()> {
        self.base_account.set_sequence(sequence)
    }

    fn validate(&self) -> CustosResult<()> {
        ValidationUtils::validate_module_name(&self.name)?;
        if self.base_account.pub_key.is_some() {
            return Err(CustosError::validation(format!(
                "module account {} cannot have a public key",
                self.name
            )));
        }
        let expected = CryptoUtils::module_address(&self.name);
        if self.base_account.address != expected {
            return Err(CustosError::validation(format!(
                "address {} cannot be derived from the module name '{}'",
                self.base_account.address, self.name
            )));
        }
        ValidationUtils::validate_permissions(&self.permissions)
    }
}

impl ModuleAccountI for ModuleAccount {
    fn name(&self) -> &str {
        &self.name
    }

    fn permissions(&self) -> &[String] {
        &self.permissions
    }
}

impl fmt::Display for ModuleAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModuleAccount{{name: {}, address: {}, account_number: {}, permissions: [{}]}}",
            self.name,
            self.base_account.address,
            self.base_account.account_number,
            self.permissions.join(", ")
        )
    }
}

/// Any account the registry stores.
///
/// Binary storage goes through [`crate::codec::AccountCodec`], which wraps
/// the concrete variant in a type-tagged envelope; this enum's own serde
/// form (tagged by `"@type"`) is only used by JSON documents such as genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
#[non_exhaustive]
pub enum Account {
    /// Externally owned account
    #[serde(rename = "/custos.auth.v1.BaseAccount")]
    Base(BaseAccount),
    /// System-owned module account
    #[serde(rename = "/custos.auth.v1.ModuleAccount")]
    Module(ModuleAccount),
}

impl Account {
    /// Borrow as a module account, if it is one
    pub fn as_module(&self) -> Option<&ModuleAccount> {
        match self {
            Self::Module(macc) => Some(macc),
            _ => None,
        }
    }

    /// Convert into a module account, if it is one
    pub fn into_module(self) -> Option<ModuleAccount> {
        match self {
            Self::Module(macc) => Some(macc),
            _ => None,
        }
    }

    /// Whether this is a module account
    pub fn is_module(&self) -> bool {
        matches!(self, Self::Module(_))
    }

    fn inner(&self) -> &dyn AccountI {
        match self {
            Self::Base(acc) => acc,
            Self::Module(macc) => macc,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn AccountI {
        match self {
            Self::Base(acc) => acc,
            Self::Module(macc) => macc,
        }
    }
}

impl AccountI for Account {
    fn address(&self) -> &Address {
        self.inner().address()
    }

    fn set_address(&mut self, address: Address) -> CustosResult<()> {
        self.inner_mut().set_address(address)
    }

    fn pub_key(&self) -> Option<&PubKey> {
        self.inner().pub_key()
    }

    fn set_pub_key(&mut self, pub_key: PubKey) -> CustosResult<()> {
        self.inner_mut().set_pub_key(pub_key)
    }

    fn account_number(&self) -> AccountNumber {
        self.inner().account_number()
    }

    fn set_account_number(&mut self, account_number: AccountNumber) -> CustosResult<()> {
        self.inner_mut().set_account_number(account_number)
    }

    fn sequence(&self) -> Sequence {
        self.inner().sequence()
    }

    fn set_sequence(&mut self, sequence: Sequence) -> CustosResult<()> {
        self.inner_mut().set_sequence(sequence)
    }

    fn validate(&self) -> CustosResult<()> {
        self.inner().validate()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base(acc) => acc.fmt(f),
            Self::Module(macc) => macc.fmt(f),
        }
    }
}

impl From<BaseAccount> for Account {
    fn from(acc: BaseAccount) -> Self {
        Self::Base(acc)
    }
}

impl From<ModuleAccount> for Account {
    fn from(macc: ModuleAccount) -> Self {
        Self::Module(macc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ed25519_key(seed: u8) -> PubKey {
        PubKey::ed25519(vec![seed; 32]).unwrap()
    }

    #[test]
    fn test_pub_key_lengths() {
        assert!(PubKey::ed25519(vec![1; 32]).is_ok());
        assert!(PubKey::ed25519(vec![1; 33]).is_err());
        assert!(PubKey::secp256k1(vec![2; 33]).is_ok());
        assert!(PubKey::secp256k1(vec![2; 32]).is_err());
    }

    #[test]
    fn test_base_account_pub_key_must_match_address() {
        let key = ed25519_key(3);
        let mut acc = BaseAccount::new(key.address());
        acc.set_pub_key(key).unwrap();
        assert!(acc.validate().is_ok());

        let mut other = BaseAccount::new(Address::new([1; 20]));
        other.set_pub_key(ed25519_key(3)).unwrap();
        assert!(other.validate().is_err());
    }

    #[test]
    fn test_module_account_lives_at_derived_address() {
        let macc = ModuleAccount::new("fee_collector", [BURNER]);
        assert_eq!(*macc.address(), CryptoUtils::module_address("fee_collector"));
        assert!(macc.validate().is_ok());
        assert!(macc.has_permission(BURNER));
        assert!(!macc.has_permission(MINTER));
    }

    #[test]
    fn test_module_account_rejects_foreign_state() {
        let mut macc = ModuleAccount::new("fee_collector", Vec::<String>::new());
        assert!(macc.set_pub_key(ed25519_key(1)).is_err());
        assert!(macc.set_address(Address::new([5; 20])).is_err());

        macc.base_account.address = Address::new([5; 20]);
        assert!(macc.validate().is_err());

        let dup = ModuleAccount::new("mint", [MINTER, MINTER]);
        assert!(dup.validate().is_err());

        let blank = ModuleAccount::new("", [MINTER]);
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_account_dispatch() {
        let mut acc: Account = ModuleAccount::new("bonded_pool", [BURNER, STAKING]).into();
        assert!(acc.is_module());
        acc.set_account_number(4).unwrap();
        acc.set_sequence(2).unwrap();
        assert_eq!(acc.account_number(), 4);
        assert_eq!(acc.sequence(), 2);
        assert_eq!(acc.as_module().unwrap().permissions, vec![BURNER, STAKING]);

        let base: Account = BaseAccount::new(Address::new([1; 20])).into();
        assert!(base.as_module().is_none());
        assert!(base.into_module().is_none());
    }

    #[test]
    fn test_json_is_type_tagged() {
        let acc: Account = BaseAccount::new(Address::new([1; 20])).into();
        let json = serde_json::to_value(&acc).unwrap();
        assert_eq!(json["@type"], "/custos.auth.v1.BaseAccount");
        assert_eq!(json["address"], "01".repeat(20));

        let back: Account = serde_json::from_value(json).unwrap();
        assert_eq!(back, acc);
    }
}
