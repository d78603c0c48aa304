//! # Custos Auth
//!
//! The account registry of the Custos keeper: a persistent mapping from
//! addresses to account records, layered on the ordered key-value store
//! from `custos-common`.
//!
//! ## Architecture Overview
//!
//! ### [`AccountKeeper`] - The Registry
//! - Creates, fetches, updates and removes accounts
//! - Resolves module accounts, creating them on first access
//! - Validates module permissions against the [`PermissionTable`]
//! - Imports and exports genesis state
//!
//! ### [`AccountStore`] - Persistence
//! - Crash-consistent account number allocation
//! - Primary `address -> account` and secondary `number -> address` indexes
//! - Lazy, address-ordered iteration
//!
//! ### [`AccountCodec`] - Wire Format
//! - Type-tagged envelopes so unknown variants can be stored opaquely
//! - Deterministic bincode payloads
//!
//! ## Example Usage
//!
//! ```rust
//! use custos_auth::{AccountKeeper, PermissionTable, BURNER};
//! use custos_auth::account::ModuleAccountI;
//! use custos_common::prelude::*;
//!
//! # fn main() -> CustosResult<()> {
//! let table = PermissionTable::new([("fee_collector", vec![BURNER])])?;
//! let keeper = AccountKeeper::new(table, "cosmos")?;
//! let db = Database::in_memory();
//!
//! let mut ctx = db.begin()?;
//! let macc = keeper.get_module_account(&mut ctx, "fee_collector")?;
//! keeper.validate_permissions(&macc)?;
//! ctx.commit()?;
//!
//! assert!(macc.has_permission(BURNER));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod account;
pub mod codec;
pub mod genesis;
pub mod keeper;
pub mod keys;
pub mod params;
pub mod permissions;
pub mod query;
pub mod store;

pub use account::{
    Account, AccountI, BaseAccount, ModuleAccount, ModuleAccountI, PubKey, BURNER, MINTER, STAKING,
};
pub use codec::{AccountCodec, AccountEnvelope};
pub use genesis::GenesisState;
pub use keeper::AccountKeeper;
pub use params::Params;
pub use permissions::{PermissionTable, PermissionsForAddress};
pub use query::{AccountsResponse, AuthQuerier, PageRequest, PageResponse};
pub use store::{AccountIter, AccountStore};
