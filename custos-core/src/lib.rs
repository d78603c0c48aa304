// lib.rs - Custos Core Library
//! # Custos Core
//!
//! Bootstrapping for the Custos account keeper.
//!
//! This crate turns a configuration file into a running account registry:
//! it loads and validates [`RegistryConfig`], opens the database and builds
//! the [`custos_auth::AccountKeeper`], and runs keeper operations inside
//! store contexts that commit on success and are discarded on failure.
//!
//! ## Example
//!
//! ```rust
//! use custos_core::{Registry, RegistryConfig};
//!
//! # fn main() -> custos_common::error::CustosResult<()> {
//! let registry = Registry::in_memory(RegistryConfig::default())?;
//! let fee_collector = registry.module_account("fee_collector")?;
//! assert_eq!(fee_collector.name, "fee_collector");
//!
//! let genesis = registry.export_genesis()?;
//! assert_eq!(genesis.accounts.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// Configuration module
pub mod config;

/// Registry bootstrap
pub mod node;

/// Prelude with commonly used types
pub mod prelude {
    pub use crate::config::RegistryConfig;
    pub use crate::node::Registry;
    pub use custos_auth::{Account, AccountI, AccountKeeper, GenesisState, ModuleAccountI};
    // Re-export custos-common prelude
    pub use custos_common::prelude::*;
}

// Re-export main types at crate root
pub use config::RegistryConfig;
pub use node::Registry;

/// Custos version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
