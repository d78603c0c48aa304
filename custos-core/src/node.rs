// node.rs - Registry bootstrap
use crate::config::RegistryConfig;
use custos_auth::{AccountKeeper, AuthQuerier, GenesisState, ModuleAccount};
use custos_common::prelude::*;
use tracing::{error, info};

/// A configured account registry bound to its database
pub struct Registry {
    config: RegistryConfig,
    db: Database,
    keeper: AccountKeeper,
}

impl Registry {
    /// Open the RocksDB database named by `config` and build the keeper
    pub fn open(config: RegistryConfig) -> CustosResult<Self> {
        config.validate()?;
        let db = Database::open_with_config(&config.database_config())?;
        Self::with_database(config, db)
    }

    /// Registry over a fresh in-memory database
    pub fn in_memory(config: RegistryConfig) -> CustosResult<Self> {
        config.validate()?;
        Self::with_database(config, Database::in_memory())
    }

    fn with_database(config: RegistryConfig, db: Database) -> CustosResult<Self> {
        let keeper = AccountKeeper::new(config.permission_table()?, &config.bech32_prefix)?;

        info!("Initialized account registry");
        info!("  - Database: {}", config.db_path);
        info!("  - Bech32 prefix: {}", config.bech32_prefix);
        info!("  - Module accounts: {}", keeper.permissions().len());

        Ok(Self { config, db, keeper })
    }

    /// The active configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The account keeper
    pub fn keeper(&self) -> &AccountKeeper {
        &self.keeper
    }

    /// Read-only queries against this registry's keeper
    pub fn querier(&self) -> AuthQuerier<'_> {
        AuthQuerier::new(&self.keeper)
    }

    /// The underlying database
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Run `op` in a fresh store context, committing only if it succeeds.
    ///
    /// On error the context is dropped and none of its writes persist.
    pub fn scoped<T, F>(&self, op: F) -> CustosResult<T>
    where
        F: FnOnce(&AccountKeeper, &mut StoreContext<'_>) -> CustosResult<T>,
    {
        let mut ctx = self.db.begin()?;
        match op(&self.keeper, &mut ctx) {
            Ok(value) => {
                ctx.commit()?;
                Ok(value)
            }
            Err(e) => {
                if e.is_fatal() {
                    error!(error = %e, "aborting store context on fatal error");
                }
                ctx.discard();
                Err(e)
            }
        }
    }

    /// Run a read-only `op`; nothing is committed
    pub fn read<T, F>(&self, op: F) -> CustosResult<T>
    where
        F: FnOnce(&AccountKeeper, &StoreContext<'_>) -> CustosResult<T>,
    {
        let ctx = self.db.begin()?;
        op(&self.keeper, &ctx)
    }

    /// Import a genesis document, applying configured parameter overrides
    pub fn init_genesis(&self, state: &GenesisState) -> CustosResult<()> {
        let mut state = state.clone();
        if let Some(params) = self.config.params {
            info!("Applying configured auth params over genesis params");
            state.params = params;
        }
        self.scoped(|keeper, ctx| keeper.init_genesis(ctx, &state))
    }

    /// Snapshot the registry
    pub fn export_genesis(&self) -> CustosResult<GenesisState> {
        self.read(|keeper, ctx| keeper.export_genesis(ctx))
    }

    /// The module's account, created and committed on first access
    pub fn module_account(&self, name: &str) -> CustosResult<ModuleAccount> {
        self.scoped(|keeper, ctx| keeper.get_module_account(ctx, name))
    }
}
