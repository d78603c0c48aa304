//! Genesis import and export

use crate::account::{Account, AccountI};
use crate::keeper::AccountKeeper;
use crate::params::Params;
use crate::permissions::PermissionsForAddress;
use custos_common::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Bootstrap snapshot of the account registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisState {
    /// Auth parameters
    pub params: Params,
    /// Accounts in export (address) order
    pub accounts: Vec<Account>,
    /// Module permissions configured when the snapshot was taken
    pub module_accounts: Vec<PermissionsForAddress>,
    /// Counter value the next allocation returns
    pub next_account_number: AccountNumber,
}

impl GenesisState {
    /// Stateless checks: valid params, self-valid accounts, and no address
    /// or account number used twice.
    pub fn validate(&self) -> CustosResult<()> {
        self.params.validate()?;

        let mut addresses = BTreeSet::new();
        let mut numbers = BTreeMap::new();
        for account in &self.accounts {
            account.validate()?;
            if !addresses.insert(*account.address()) {
                return Err(CustosError::validation(format!(
                    "duplicate account found in genesis state; address: {}",
                    account.address()
                )));
            }
            if let Some(owner) = numbers.insert(account.account_number(), *account.address()) {
                return Err(CustosError::validation(format!(
                    "duplicate account number {} in genesis state; held by {} and {}",
                    account.account_number(),
                    owner,
                    account.address()
                )));
            }
        }

        for entry in &self.module_accounts {
            ValidationUtils::validate_module_name(&entry.name)?;
            ValidationUtils::validate_permissions(&entry.permissions)?;
            if entry.address != CryptoUtils::module_address(&entry.name) {
                return Err(CustosError::validation(format!(
                    "module {} listed with foreign address {}",
                    entry.name, entry.address
                )));
            }
        }
        Ok(())
    }

    /// Parse a JSON document
    pub fn from_json(json: &str) -> CustosResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render as pretty-printed JSON
    pub fn to_json(&self) -> CustosResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a JSON document from disk
    pub fn load(path: impl AsRef<Path>) -> CustosResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Write a JSON document to disk
    pub fn save(&self, path: impl AsRef<Path>) -> CustosResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl AccountKeeper {
    /// Load `state` into an empty store.
    ///
    /// Accounts keep their numbers and the counter resumes past them. Every
    /// configured module account is then resolved (created if the snapshot
    /// lacks it) and checked against the permission table.
    /// Nothing is staged unless `state` passes validation and every imported
    /// module account stays within its configured permissions.
    pub fn init_genesis(
        &self,
        ctx: &mut StoreContext<'_>,
        state: &GenesisState,
    ) -> CustosResult<()> {
        let span = self.logger();
        let _enter = span.enter();

        state.validate()?;
        for account in &state.accounts {
            if let Some(macc) = account.as_module() {
                self.validate_permissions(macc)?;
            }
        }

        self.set_params(ctx, &state.params)?;
        let next = self
            .store()
            .import_all(ctx, &state.accounts, state.next_account_number)?;

        let configured: BTreeSet<&str> = self.permissions().module_names().collect();
        let listed: BTreeSet<&str> =
            state.module_accounts.iter().map(|m| m.name.as_str()).collect();
        if !state.module_accounts.is_empty() && configured != listed {
            tracing::warn!(
                configured = ?configured,
                genesis = ?listed,
                "genesis module accounts differ from configured module permissions"
            );
        }

        for name in configured {
            let macc = self.get_module_account(ctx, name)?;
            self.validate_permissions(&macc)?;
        }

        tracing::info!(
            accounts = state.accounts.len(),
            next_account_number = next,
            "initialized auth genesis"
        );
        Ok(())
    }

    /// Snapshot the registry without advancing the account counter
    pub fn export_genesis(&self, ctx: &StoreContext<'_>) -> CustosResult<GenesisState> {
        let state = GenesisState {
            params: self.get_params(ctx)?,
            accounts: self.get_all_accounts(ctx)?,
            module_accounts: self.permissions().iter().cloned().collect(),
            next_account_number: self.store().peek_next_account_number(ctx)?,
        };
        self.logger().in_scope(|| {
            tracing::info!(accounts = state.accounts.len(), "exported auth genesis")
        });
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{BaseAccount, ModuleAccount, PubKey, BURNER, MINTER};
    use crate::permissions::PermissionTable;
    use tempfile::tempdir;

    fn keeper() -> AccountKeeper {
        let table = PermissionTable::new([("fee_collector", vec![BURNER]), ("mint", vec![MINTER])])
            .unwrap();
        AccountKeeper::new(table, "cosmos").unwrap()
    }

    fn populated(keeper: &AccountKeeper, db: &Database) {
        let mut ctx = db.begin().unwrap();
        keeper.get_module_account(&mut ctx, "mint").unwrap();

        let key = PubKey::ed25519(vec![5; 32]).unwrap();
        let mut signer = keeper.new_account_with_address(&mut ctx, key.address()).unwrap();
        signer.set_pub_key(key).unwrap();
        signer.set_sequence(12).unwrap();
        keeper.set_account(&mut ctx, &signer).unwrap();

        let doomed = keeper
            .new_account_with_address(&mut ctx, Address::new([9; 20]))
            .unwrap();
        keeper.set_account(&mut ctx, &doomed).unwrap();
        keeper.remove_account(&mut ctx, &doomed).unwrap();

        keeper.get_module_account(&mut ctx, "fee_collector").unwrap();
        ctx.commit().unwrap();
    }

    #[test]
    fn test_genesis_fidelity() {
        let keeper = keeper();
        let source = Database::in_memory();
        populated(&keeper, &source);
        let exported = keeper.export_genesis(&source.begin().unwrap()).unwrap();
        assert_eq!(exported.next_account_number, 4);

        let target = Database::in_memory();
        let mut ctx = target.begin().unwrap();
        keeper.init_genesis(&mut ctx, &exported).unwrap();
        ctx.commit().unwrap();

        let reexported = keeper.export_genesis(&target.begin().unwrap()).unwrap();
        assert_eq!(reexported, exported);

        let mut ctx = target.begin().unwrap();
        assert_eq!(keeper.get_next_account_number(&mut ctx).unwrap(), 4);
    }

    #[test]
    fn test_export_does_not_advance_counter() {
        let keeper = keeper();
        let db = Database::in_memory();
        populated(&keeper, &db);

        let ctx = db.begin().unwrap();
        let first = keeper.export_genesis(&ctx).unwrap();
        let second = keeper.export_genesis(&ctx).unwrap();
        assert_eq!(first.next_account_number, second.next_account_number);
        assert_eq!(ctx.pending_writes(), 0);
    }

    #[test]
    fn test_init_creates_missing_module_accounts() {
        let keeper = keeper();
        let mut signer = BaseAccount::new(Address::new([1; 20]));
        signer.account_number = 6;
        let state = GenesisState {
            accounts: vec![signer.into()],
            ..GenesisState::default()
        };

        let db = Database::in_memory();
        let mut ctx = db.begin().unwrap();
        keeper.init_genesis(&mut ctx, &state).unwrap();

        // configured modules are resolved in name order after the import
        let fee = keeper.get_module_account(&mut ctx, "fee_collector").unwrap();
        let mint = keeper.get_module_account(&mut ctx, "mint").unwrap();
        assert_eq!(fee.account_number(), 7);
        assert_eq!(mint.account_number(), 8);
    }

    #[test]
    fn test_init_rejects_overreaching_module_account() {
        let keeper = keeper();
        let state = GenesisState {
            accounts: vec![ModuleAccount::new("fee_collector", [BURNER, MINTER]).into()],
            ..GenesisState::default()
        };

        let db = Database::in_memory();
        let mut ctx = db.begin().unwrap();
        let err = keeper.init_genesis(&mut ctx, &state).unwrap_err();
        assert!(matches!(err, CustosError::InvalidPermission(_)));
        assert_eq!(ctx.pending_writes(), 0);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut a = BaseAccount::new(Address::new([1; 20]));
        a.account_number = 1;
        let mut b = BaseAccount::new(Address::new([2; 20]));
        b.account_number = 1;

        let state = GenesisState {
            accounts: vec![a.clone().into(), b.into()],
            ..GenesisState::default()
        };
        assert!(state.validate().is_err());

        let state = GenesisState {
            accounts: vec![a.clone().into(), a.into()],
            ..GenesisState::default()
        };
        let err = state.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate account"));
    }

    #[test]
    fn test_json_file_round_trip() {
        let keeper = keeper();
        let db = Database::in_memory();
        populated(&keeper, &db);
        let state = keeper.export_genesis(&db.begin().unwrap()).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("genesis.json");
        state.save(&path).unwrap();
        assert_eq!(GenesisState::load(&path).unwrap(), state);

        let json = state.to_json().unwrap();
        assert!(json.contains("/custos.auth.v1.ModuleAccount"));
        assert!(json.contains("\"next_account_number\": 4"));
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let state = GenesisState::from_json("{}").unwrap();
        assert_eq!(state.params, Params::default());
        assert!(state.accounts.is_empty());
        assert!(state.validate().is_ok());
    }
}
