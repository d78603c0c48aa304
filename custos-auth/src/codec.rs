//! Self-describing binary encoding of accounts
//!
//! Every stored account is wrapped in an [`AccountEnvelope`]: the type URL
//! of its concrete variant plus the variant's own bincode payload. Code
//! that does not know a variant can still move the envelope around as
//! opaque bytes; only [`AccountCodec::unpack`] needs to recognise the tag.

use crate::account::{Account, BaseAccount, ModuleAccount};
use custos_common::prelude::*;
use custos_common::types::hex_bytes;
use serde::{Deserialize, Serialize};

/// Type URL of [`BaseAccount`]
pub const BASE_ACCOUNT_TYPE_URL: &str = "/custos.auth.v1.BaseAccount";

/// Type URL of [`ModuleAccount`]
pub const MODULE_ACCOUNT_TYPE_URL: &str = "/custos.auth.v1.ModuleAccount";

/// Type-tagged wrapper around an encoded account variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEnvelope {
    /// Identifies the concrete variant
    pub type_url: String,
    /// The variant's encoded fields
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

impl CustosSerialize for AccountEnvelope {
    fn preferred_encoding() -> EncodingType {
        EncodingType::Bincode
    }
}

impl AccountEnvelope {
    /// Parse an envelope without interpreting its payload
    pub fn from_bytes(bytes: &[u8]) -> CustosResult<Self> {
        Self::decode(bytes)
    }

    /// Encode the envelope
    pub fn to_bytes(&self) -> CustosResult<Vec<u8>> {
        self.encode()
    }
}

/// Encodes and decodes [`Account`]s through [`AccountEnvelope`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountCodec;

impl AccountCodec {
    /// Create the codec
    pub fn new() -> Self {
        Self
    }

    /// Type URLs this codec can unpack
    pub fn registered_type_urls(&self) -> &'static [&'static str] {
        &[BASE_ACCOUNT_TYPE_URL, MODULE_ACCOUNT_TYPE_URL]
    }

    /// Whether `type_url` names a known variant
    pub fn is_registered(&self, type_url: &str) -> bool {
        self.registered_type_urls().contains(&type_url)
    }

    /// Wrap an account in its envelope
    pub fn pack(&self, account: &Account) -> CustosResult<AccountEnvelope> {
        let (type_url, value) = match account {
            Account::Base(acc) => (BASE_ACCOUNT_TYPE_URL, acc.encode()?),
            Account::Module(macc) => (MODULE_ACCOUNT_TYPE_URL, macc.encode()?),
        };
        Ok(AccountEnvelope {
            type_url: type_url.to_string(),
            value,
        })
    }

    /// Open an envelope into a typed account
    pub fn unpack(&self, envelope: &AccountEnvelope) -> CustosResult<Account> {
        match envelope.type_url.as_str() {
            BASE_ACCOUNT_TYPE_URL => Ok(Account::Base(BaseAccount::decode(&envelope.value)?)),
            MODULE_ACCOUNT_TYPE_URL => Ok(Account::Module(ModuleAccount::decode(&envelope.value)?)),
            other => Err(CustosError::decode(format!(
                "no concrete account type registered for type URL {other}"
            ))),
        }
    }

    /// Encode an account to bytes
    pub fn encode(&self, account: &Account) -> CustosResult<Vec<u8>> {
        self.pack(account)?.to_bytes()
    }

    /// Decode bytes produced by [`AccountCodec::encode`]
    pub fn decode(&self, bytes: &[u8]) -> CustosResult<Account> {
        self.unpack(&AccountEnvelope::from_bytes(bytes)?)
    }
}
