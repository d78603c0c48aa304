//! Read-only queries over the account registry
//!
//! Nothing here writes: module-account queries report what is stored and
//! never create accounts.

use crate::account::{Account, AccountI, ModuleAccount};
use crate::keeper::AccountKeeper;
use crate::params::Params;
use custos_common::prelude::*;
use serde::{Deserialize, Serialize};

/// Page size used when a request does not set one
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Key-based pagination request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Resume at this address (inclusive); `None` starts from the beginning
    pub key: Option<Address>,
    /// Maximum number of items; zero selects [`DEFAULT_PAGE_LIMIT`]
    pub limit: usize,
}

/// Pagination state returned with a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    /// Key to pass in the next request, `None` on the last page
    pub next_key: Option<Address>,
}

/// A page of accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsResponse {
    /// Accounts in address order
    pub accounts: Vec<Account>,
    /// Where to continue
    pub pagination: PageResponse,
}

/// Query front of an [`AccountKeeper`]
#[derive(Debug, Clone, Copy)]
pub struct AuthQuerier<'k> {
    keeper: &'k AccountKeeper,
}

impl<'k> AuthQuerier<'k> {
    /// Query `keeper`
    pub fn new(keeper: &'k AccountKeeper) -> Self {
        Self { keeper }
    }

    /// Account at a Bech32 address
    pub fn account(&self, ctx: &StoreContext<'_>, address: &str) -> CustosResult<Account> {
        let address = self.keeper.address_codec().decode(address)?;
        self.keeper
            .get_account(ctx, &address)?
            .ok_or_else(|| CustosError::unknown_address(self.display(&address)))
    }

    /// One page of accounts in address order
    pub fn accounts(
        &self,
        ctx: &StoreContext<'_>,
        page: &PageRequest,
    ) -> CustosResult<AccountsResponse> {
        let limit = if page.limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            page.limit
        };

        let mut accounts = Vec::with_capacity(limit.min(DEFAULT_PAGE_LIMIT));
        let mut next_key = None;
        for account in self.keeper.store().iter_from(ctx, page.key.as_ref())? {
            let account = account?;
            if accounts.len() == limit {
                next_key = Some(*account.address());
                break;
            }
            accounts.push(account);
        }

        Ok(AccountsResponse {
            accounts,
            pagination: PageResponse { next_key },
        })
    }

    /// Current parameters
    pub fn params(&self, ctx: &StoreContext<'_>) -> CustosResult<Params> {
        self.keeper.get_params(ctx)
    }

    /// Stored accounts of every configured module, in module-name order.
    ///
    /// Modules whose account has not been created yet are skipped.
    pub fn module_accounts(&self, ctx: &StoreContext<'_>) -> CustosResult<Vec<ModuleAccount>> {
        let mut out = Vec::new();
        for name in self.keeper.permissions().module_names() {
            if let Some(macc) = self.stored_module_account(ctx, name)? {
                out.push(macc);
            }
        }
        Ok(out)
    }

    /// Stored account of a configured module
    pub fn module_account_by_name(
        &self,
        ctx: &StoreContext<'_>,
        name: &str,
    ) -> CustosResult<ModuleAccount> {
        let address = self.keeper.permissions().lookup(name)?.address;
        self.stored_module_account(ctx, name)?
            .ok_or_else(|| CustosError::unknown_address(self.display(&address)))
    }

    /// The configured Bech32 prefix
    pub fn bech32_prefix(&self) -> &str {
        self.keeper.bech32_prefix()
    }

    /// Render raw address bytes as Bech32
    pub fn address_bytes_to_string(&self, bytes: &[u8]) -> CustosResult<String> {
        self.keeper.address_codec().bytes_to_string(bytes)
    }

    /// Parse a Bech32 address into raw bytes
    pub fn address_string_to_bytes(&self, text: &str) -> CustosResult<Vec<u8>> {
        self.keeper.address_codec().string_to_bytes(text)
    }

    /// Bech32 address of the account holding `account_number`
    pub fn account_address_by_id(
        &self,
        ctx: &StoreContext<'_>,
        account_number: AccountNumber,
    ) -> CustosResult<String> {
        self.keeper.get_account_address_by_id(ctx, account_number)
    }

    fn stored_module_account(
        &self,
        ctx: &StoreContext<'_>,
        name: &str,
    ) -> CustosResult<Option<ModuleAccount>> {
        let address = self.keeper.permissions().lookup(name)?.address;
        match self.keeper.get_account(ctx, &address)? {
            Some(account) => account.into_module().map(Some).ok_or_else(|| {
                CustosError::type_mismatch(format!(
                    "account at module address {address} of {name} is not a module account"
                ))
            }),
            None => Ok(None),
        }
    }

    fn display(&self, address: &Address) -> String {
        self.keeper
            .address_codec()
            .encode(address)
            .unwrap_or_else(|_| address.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{BURNER, MINTER};
    use crate::permissions::PermissionTable;

    fn keeper() -> AccountKeeper {
        let table = PermissionTable::new([("fee_collector", vec![BURNER]), ("mint", vec![MINTER])])
            .unwrap();
        AccountKeeper::new(table, "cosmos").unwrap()
    }

    fn seed(keeper: &AccountKeeper, db: &Database, count: u8) {
        let mut ctx = db.begin().unwrap();
        for i in 0..count {
            let acc = keeper
                .new_account_with_address(&mut ctx, Address::new([i + 1; 20]))
                .unwrap();
            keeper.set_account(&mut ctx, &acc).unwrap();
        }
        ctx.commit().unwrap();
    }

    #[test]
    fn test_account_by_bech32() {
        let keeper = keeper();
        let db = Database::in_memory();
        seed(&keeper, &db, 1);
        let querier = AuthQuerier::new(&keeper);
        let ctx = db.begin().unwrap();

        let text = keeper.address_codec().encode(&Address::new([1; 20])).unwrap();
        assert_eq!(querier.account(&ctx, &text).unwrap().account_number(), 0);

        let missing = keeper.address_codec().encode(&Address::new([2; 20])).unwrap();
        assert!(querier.account(&ctx, &missing).unwrap_err().is_not_found());
        let foreign = Bech32Codec::new("osmo")
            .unwrap()
            .encode(&Address::new([1; 20]))
            .unwrap();
        assert!(matches!(
            querier.account(&ctx, &foreign),
            Err(CustosError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_pagination() {
        let keeper = keeper();
        let db = Database::in_memory();
        seed(&keeper, &db, 5);
        let querier = AuthQuerier::new(&keeper);
        let ctx = db.begin().unwrap();

        let mut page = PageRequest {
            key: None,
            limit: 2,
        };
        let mut seen = Vec::new();
        loop {
            let res = querier.accounts(&ctx, &page).unwrap();
            assert!(res.accounts.len() <= 2);
            seen.extend(res.accounts.iter().map(|a| a.account_number()));
            match res.pagination.next_key {
                Some(key) => page.key = Some(key),
                None => break,
            }
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);

        let all = querier.accounts(&ctx, &PageRequest::default()).unwrap();
        assert_eq!(all.accounts.len(), 5);
        assert_eq!(all.pagination.next_key, None);
    }

    #[test]
    fn test_module_queries_never_create() {
        let keeper = keeper();
        let db = Database::in_memory();
        let querier = AuthQuerier::new(&keeper);

        {
            let ctx = db.begin().unwrap();
            assert!(querier.module_accounts(&ctx).unwrap().is_empty());
            assert!(querier.module_account_by_name(&ctx, "mint").is_err());
            assert!(matches!(
                querier.module_account_by_name(&ctx, "gov"),
                Err(CustosError::UnknownModule(_))
            ));
            assert_eq!(ctx.pending_writes(), 0);
        }

        let mut ctx = db.begin().unwrap();
        keeper.get_module_account(&mut ctx, "mint").unwrap();
        ctx.commit().unwrap();

        let ctx = db.begin().unwrap();
        let maccs = querier.module_accounts(&ctx).unwrap();
        assert_eq!(maccs.len(), 1);
        assert_eq!(querier.module_account_by_name(&ctx, "mint").unwrap(), maccs[0]);
    }

    #[test]
    fn test_address_conversions() {
        let keeper = keeper();
        let querier = AuthQuerier::new(&keeper);
        let bytes = [7u8; 20];

        let text = querier.address_bytes_to_string(&bytes).unwrap();
        assert!(text.starts_with("cosmos1"));
        assert_eq!(querier.address_string_to_bytes(&text).unwrap(), bytes.to_vec());
        assert!(querier.address_bytes_to_string(&[]).is_err());
        assert!(querier.address_string_to_bytes("").is_err());
        assert_eq!(querier.bech32_prefix(), "cosmos");
    }

    #[test]
    fn test_params_and_id_lookup() {
        let keeper = keeper();
        let db = Database::in_memory();
        seed(&keeper, &db, 2);
        let querier = AuthQuerier::new(&keeper);
        let ctx = db.begin().unwrap();

        assert_eq!(querier.params(&ctx).unwrap(), Params::default());
        let text = querier.account_address_by_id(&ctx, 1).unwrap();
        assert_eq!(
            querier.address_string_to_bytes(&text).unwrap(),
            vec![2u8; 20]
        );
        assert!(querier.account_address_by_id(&ctx, 7).is_err());
    }
}
