//! # Custos Common
//!
//! Common utilities, traits, and standardized patterns for the Custos
//! account keeper. This crate is the single source of truth for shared
//! functionality, preventing code duplication and circular dependencies
//! between the account layer and the binaries built on it.
//!
//! ## Modules
//!
//! - **address**: Bech32 address text encoding
//! - **crypto**: Hashing and deterministic address derivation
//! - **database**: Ordered key-value engines and transactional store contexts
//! - **error**: The workspace error taxonomy
//! - **serialization**: Deterministic binary and JSON encoding patterns
//! - **types**: Common type definitions and constants
//! - **validation**: Input validation utilities
//!
//! ## Example Usage
//!
//! ```rust
//! use custos_common::prelude::*;
//!
//! # fn main() -> CustosResult<()> {
//! let db = Database::in_memory();
//! let mut ctx = db.begin()?;
//! ctx.set(b"greeting".to_vec(), 42u64.encode()?);
//! ctx.commit()?;
//!
//! let ctx = db.begin()?;
//! let stored = ctx.get(b"greeting")?.map(|bz| u64::decode(&bz)).transpose()?;
//! assert_eq!(stored, Some(42));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod address;
pub mod crypto;
pub mod database;
pub mod error;
pub mod serialization;
pub mod types;
pub mod validation;

/// Re-export commonly used types and traits
pub mod prelude {
    pub use crate::address::{AddressCodec, Bech32Codec};
    pub use crate::crypto::CryptoUtils;
    pub use crate::database::{
        BatchOp, CustosDatabase, Database, DatabaseConfig, KvStore, MemoryDatabase, StoreContext,
    };
    pub use crate::error::{CustosError, CustosResult};
    pub use crate::serialization::{CustosSerialize, EncodingType};
    pub use crate::types::{AccountNumber, Address, Hash, Sequence};
    pub use crate::validation::ValidationUtils;
}

/// Custos Common crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
